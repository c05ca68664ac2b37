use crate::{
    api::{attendance, employee},
    auth::{handlers, middleware::auth_middleware},
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

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(handlers::login)),
            )
            .service(web::resource("/session").route(web::get().to(handlers::session))),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(build_limiter(config.rate_protected_per_min)) // rate limiting
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    // /employees/departments
                    .service(
                        web::resource("/departments")
                            .route(web::get().to(employee::departments)),
                    )
                    // /employees/export
                    .service(
                        web::resource("/export").route(web::get().to(employee::export_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_for_date))
                            .route(web::post().to(attendance::mark)),
                    )
                    // /attendance/summary
                    .service(web::resource("/summary").route(web::get().to(attendance::summary)))
                    // /attendance/{employee_id}/calendar
                    .service(
                        web::resource("/{employee_id}/calendar")
                            .route(web::get().to(attendance::calendar)),
                    )
                    // /attendance/{employee_id}/export
                    .service(
                        web::resource("/{employee_id}/export")
                            .route(web::get().to(attendance::export_history)),
                    )
                    // /attendance/{employee_id}
                    .service(
                        web::resource("/{employee_id}").route(web::get().to(attendance::history)),
                    ),
            ),
    );
}
