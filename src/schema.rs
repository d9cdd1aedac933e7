table! {
    game_comments (id) {
        id -> Int8,
        game_id -> Int8,
        author_id -> Int8,
        content -> Text,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

table! {
    game_ratings (id) {
        id -> Int8,
        game_id -> Int8,
        player_id -> Int8,
        result -> Varchar,
        goals -> Int4,
        assists -> Int4,
        verification -> Varchar,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

table! {
    games (id) {
        id -> Int8,
        title -> Varchar,
        organizer_id -> Int8,
        date -> Date,
        start_time -> Time,
        duration_minutes -> Nullable<Int4>,
        capacity -> Int4,
        fee_cents -> Int8,
        venue -> Varchar,
        rules -> Text,
        images -> Array<Text>,
        status -> Varchar,
        visibility -> Varchar,
        password -> Nullable<Varchar>,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

table! {
    notifications (id) {
        id -> Int8,
        recipient_id -> Int8,
        game_id -> Int8,
        kind -> Varchar,
        message -> Text,
        is_read -> Bool,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

table! {
    participants (game_id, user_id) {
        game_id -> Int8,
        user_id -> Int8,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

table! {
    player_details (user_id) {
        user_id -> Int8,
        age_group -> Nullable<Varchar>,
        skill_level -> Nullable<Varchar>,
        positions -> Array<Text>,
        rank_technique -> Int4,
        rank_physical -> Int4,
        rank_defense -> Int4,
        rank_attack -> Int4,
        wins -> Int4,
        draws -> Int4,
        losses -> Int4,
        goals -> Int4,
        assists -> Int4,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

table! {
    users (id) {
        id -> Int8,
        username -> Varchar,
        email -> Varchar,
        password -> Varchar,
        role -> Varchar,
        name -> Varchar,
        image -> Nullable<Varchar>,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

joinable!(game_comments -> games (game_id));
joinable!(game_comments -> users (author_id));
joinable!(game_ratings -> games (game_id));
joinable!(game_ratings -> users (player_id));
joinable!(games -> users (organizer_id));
joinable!(notifications -> games (game_id));
joinable!(notifications -> users (recipient_id));
joinable!(participants -> games (game_id));
joinable!(participants -> users (user_id));
joinable!(player_details -> users (user_id));

allow_tables_to_appear_in_same_query!(
    game_comments,
    game_ratings,
    games,
    notifications,
    participants,
    player_details,
    users,
);
