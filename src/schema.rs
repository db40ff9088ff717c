table! {
    channels (id) {
        id -> Int4,
        user_id -> Int4,
        name -> Varchar,
        description -> Varchar,
        avatar_url -> Varchar,
        banner_url -> Varchar,
        created_at -> Timestamp,
    }
}

table! {
    comments (id) {
        id -> Int4,
        video_id -> Int4,
        channel_id -> Int4,
        text -> Varchar,
        parent_comment_id -> Nullable<Int4>,
        created_at -> Timestamp,
    }
}

table! {
    subscriptions (id) {
        id -> Int4,
        subscriber_channel_id -> Int4,
        subscribed_to_channel_id -> Int4,
        created_at -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Int4,
        login -> Varchar,
        password -> Varchar,
        created_at -> Timestamp,
    }
}

table! {
    video_reactions (id) {
        id -> Int4,
        channel_id -> Int4,
        video_id -> Int4,
        reaction_type -> Varchar,
        created_at -> Timestamp,
    }
}

table! {
    videos (id) {
        id -> Int4,
        channel_id -> Int4,
        title -> Varchar,
        description -> Varchar,
        video_url -> Varchar,
        preview_url -> Varchar,
        duration -> Int4,
        views -> Int4,
        visibility -> Varchar,
        created_at -> Timestamp,
    }
}

table! {
    watch_history (id) {
        id -> Int4,
        channel_id -> Int4,
        video_id -> Int4,
        watched_at -> Timestamp,
    }
}

table! {
    watch_later (id) {
        id -> Int4,
        channel_id -> Int4,
        video_id -> Int4,
        created_at -> Timestamp,
    }
}

joinable!(channels -> users (user_id));
joinable!(videos -> channels (channel_id));
joinable!(comments -> videos (video_id));
joinable!(comments -> channels (channel_id));
joinable!(video_reactions -> videos (video_id));
joinable!(watch_later -> videos (video_id));
joinable!(watch_history -> videos (video_id));

allow_tables_to_appear_in_same_query!(
    channels,
    comments,
    subscriptions,
    users,
    video_reactions,
    videos,
    watch_history,
    watch_later,
);
