// Column names follow the legacy camelCase layout; see the initial migration.
// Jar and fly columns stay nullable because databases created before the
// migration have no NOT NULL constraints and may hold NULLs.
diesel::table! {
    users (id) {
        id -> Integer,
        username -> Text,
        password -> Text,
        token -> Nullable<Text>,
        pokemon -> Nullable<Text>,
    }
}

diesel::table! {
    jars (id) {
        id -> Integer,
        #[sql_name = "userId"]
        user_id -> Nullable<Integer>,
        name -> Nullable<Text>,
    }
}

diesel::table! {
    flies (id) {
        id -> Integer,
        #[sql_name = "jarId"]
        jar_id -> Nullable<Integer>,
        #[sql_name = "bodyColor"]
        body_color -> Nullable<Text>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, jars, flies);
