use crate::{
    api::{analytics, calls, device, notifications, personnel, reports},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Per-route limiter: `requests_per_min` burst, refilled evenly over a minute
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let signup_limiter = Arc::new(build_limiter(config.rate_signup_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes; registered first so they win over the protected scope
    cfg.service(
        web::scope(&format!("{}/auth", config.api_prefix))
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/signup")
                    .wrap(signup_limiter)
                    .route(web::post().to(handlers::signup)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/me")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::get().to(handlers::me)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/admin")
                    // /admin/team/employees
                    .service(
                        web::resource("/team/employees")
                            .route(web::get().to(personnel::list_team_employees)),
                    )
                    // /admin/employee/{id}
                    .service(
                        web::resource("/employee/{id}")
                            .route(web::put().to(personnel::update_employee)),
                    )
                    // /admin/employee/{id}/status
                    .service(
                        web::resource("/employee/{id}/status")
                            .route(web::put().to(personnel::update_employee_status)),
                    )
                    // /admin/all-reports
                    .service(web::resource("/all-reports").route(web::get().to(reports::all_reports)))
                    // /admin/report/{id}
                    .service(
                        web::resource("/report/{id}").route(web::put().to(reports::review_report)),
                    ),
            )
            .service(
                web::scope("/reports")
                    .service(web::resource("/daily").route(web::post().to(reports::submit_report)))
                    .service(web::resource("/mine").route(web::get().to(reports::my_reports))),
            )
            .service(
                web::scope("/calls")
                    .service(web::resource("/history").route(web::get().to(calls::call_history)))
                    .service(
                        web::resource("/{id}/recording").route(web::get().to(calls::call_recording)),
                    )
                    .service(web::resource("/{id}").route(web::put().to(calls::annotate_call))),
            )
            .service(
                web::scope("/device")
                    .service(web::resource("/bind").route(web::post().to(device::bind_device)))
                    .service(web::resource("/sync-calls").route(web::post().to(device::sync_calls))),
            )
            .service(
                web::scope("/notifications")
                    .service(
                        web::resource("").route(web::get().to(notifications::list_notifications)),
                    )
                    .service(
                        web::resource("/read-all").route(web::put().to(notifications::mark_all_read)),
                    )
                    .service(
                        web::resource("/{id}/read").route(web::put().to(notifications::mark_read)),
                    ),
            )
            .service(
                web::scope("/analytics")
                    .service(web::resource("/fleet-pulse").route(web::get().to(analytics::fleet_pulse))),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days, one use)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /api/auth/refresh with refresh_token
//       └─ returns a new pair, old refresh token revoked
