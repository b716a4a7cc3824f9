diesel::table! {
    users (id) {
        id -> Int4,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    admin_sessions (token) {
        token -> Varchar,
        user_id -> Int4,
        csrf_token -> Varchar,
        expires_at -> Timestamp,
        created_at -> Timestamp,
    }
}

diesel::table! {
    brands (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        url -> Nullable<Varchar>,
        description -> Nullable<Text>,
        is_visible -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    categories (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        description -> Nullable<Text>,
        is_visible -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    products (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        description -> Nullable<Text>,
        image -> Nullable<Varchar>,
        is_visible -> Bool,
        is_featured -> Bool,
        brand_id -> Int4,
        sku -> Varchar,
        quantity -> Int8,
        price -> Numeric,
        #[sql_name = "type"]
        product_type -> Varchar,
        published_at -> Date,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    category_product (category_id, product_id) {
        category_id -> Int4,
        product_id -> Int4,
    }
}

diesel::joinable!(admin_sessions -> users (user_id));
diesel::joinable!(products -> brands (brand_id));
diesel::joinable!(category_product -> categories (category_id));
diesel::joinable!(category_product -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    admin_sessions,
    brands,
    categories,
    products,
    category_product,
);
