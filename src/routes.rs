use crate::{
    api::{attendance, face, leave, overtime, shift},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .service(web::resource("/clock").route(web::post().to(attendance::clock)))
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/history").route(web::get().to(attendance::history)))
                    .service(web::resource("/stats").route(web::get().to(attendance::month_stats)))
                    .service(web::resource("/team").route(web::get().to(attendance::team)))
                    .service(web::resource("/settings").route(web::get().to(attendance::settings)))
                    .service(web::resource("/sweep").route(web::post().to(attendance::sweep))),
            )
            .service(
                web::scope("/face")
                    .service(web::resource("/register").route(web::post().to(face::register)))
                    .service(web::resource("/check").route(web::get().to(face::check)))
                    .service(web::resource("/template").route(web::get().to(face::template))),
            )
            .service(
                web::scope("/leave")
                    .service(web::resource("/types").route(web::get().to(leave::types)))
                    .service(web::resource("/balance").route(web::get().to(leave::balance)))
                    .service(web::resource("/request").route(web::post().to(leave::submit)))
                    .service(web::resource("/requests").route(web::get().to(leave::list)))
                    .service(web::resource("/pending").route(web::get().to(leave::pending)))
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve").route(web::post().to(leave::decide)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::delete().to(leave::cancel))),
            )
            .service(
                web::scope("/overtime")
                    .service(web::resource("/request").route(web::post().to(overtime::submit)))
                    .service(web::resource("/requests").route(web::get().to(overtime::list)))
                    .service(
                        web::resource("/{id}/approve").route(web::post().to(overtime::decide)),
                    ),
            )
            .service(
                web::scope("/shifts")
                    .service(web::resource("/assign").route(web::post().to(shift::assign)))
                    .service(
                        web::resource("/assignments").route(web::get().to(shift::assignments)),
                    )
                    // /shifts
                    .service(
                        web::resource("")
                            .route(web::post().to(shift::create))
                            .route(web::get().to(shift::list)),
                    )
                    // /shifts/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(shift::update))
                            .route(web::delete().to(shift::delete)),
                    ),
            ),
    );
}
