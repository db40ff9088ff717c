#[macro_use]
extern crate diesel;
extern crate dotenv;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};

mod claims;
mod config;
mod db;
mod errors;
mod helpers;
mod models;
mod pagination;
mod routes;
mod schema;

use crate::config::Config;
use crate::helpers::storage::Storage;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();

    let pool = db::build_pool(&config.database_url);
    db::initialize_database(&pool);

    let storage = Storage::from_config(&config).expect("Couldn't configure object storage");

    let bind_addr = config.bind_addr.clone();
    log::info!("Server is running on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(Cors::permissive())
            .data(config.clone())
            .data(pool.clone())
            .data(storage.clone())
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/auth")
                            .service(routes::auth::sign_up)
                            .service(routes::auth::sign_in)
                            .service(routes::auth::sign_out)
                            .service(routes::auth::check_token),
                    )
                    .service(routes::videos::get_videos)
                    .service(routes::videos::get_video)
                    .service(routes::videos::get_channel_videos)
                    .service(routes::videos::get_watch_later)
                    .service(routes::videos::add_to_watch_later)
                    .service(routes::videos::remove_from_watch_later)
                    .service(routes::videos::get_history)
                    .service(routes::videos::add_to_history)
                    .service(routes::videos::remove_from_history)
                    .service(routes::videos::get_liked_videos)
                    .service(routes::videos::like_video)
                    .service(routes::videos::unlike_video)
                    .service(routes::videos::dislike_video)
                    .service(routes::videos::undislike_video)
                    .service(routes::videos::upload_video)
                    .service(routes::channels::create_channel)
                    .service(routes::channels::get_channel)
                    .service(routes::channels::delete_channel)
                    .service(routes::comments::get_comments)
                    .service(routes::comments::get_replies)
                    .service(routes::comments::create_comment)
                    .service(routes::subscriptions::get_subscriptions)
                    .service(routes::subscriptions::create_subscription)
                    .service(routes::subscriptions::delete_subscription),
            )
    })
    .bind(&bind_addr)?
    .run()
    .await
}
