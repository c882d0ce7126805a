use crate::{
    api::{leave, role, staff_leave, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

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

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter.clone())
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::leave_list))
                            .route(web::post().to(leave::create_leave))
                            .route(web::patch().to(leave::update_leave_status)),
                    )
                    // /leave/own
                    .service(web::resource("/own").route(web::get().to(leave::own_leave_list)))
                    // /leave/staff
                    .service(
                        web::scope("/staff")
                            .service(
                                web::resource("")
                                    .route(web::get().to(staff_leave::staff_leave_list))
                                    .route(web::post().to(staff_leave::create_staff_leave))
                                    .route(web::patch().to(staff_leave::update_staff_leave)),
                            )
                            // /leave/staff/{id}
                            .service(
                                web::resource("/{id}")
                                    .route(web::get().to(staff_leave::get_staff_leave))
                                    .route(web::delete().to(staff_leave::delete_staff_leave)),
                            ),
                    )
                    // /leave/{id}
                    .service(
                        web::resource("/{id}").route(web::delete().to(leave::delete_leave)),
                    ),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_users))
                            .route(web::post().to(user::create_user))
                            .route(web::patch().to(user::update_user)),
                    )
                    // /users/email/{email}
                    .service(
                        web::resource("/email/{email}")
                            .route(web::get().to(user::get_user_by_email)),
                    )
                    // /users/{id}/reset-al
                    .service(
                        web::resource("/{id}/reset-al")
                            .route(web::post().to(user::reset_annual_leave)),
                    )
                    // /users/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(user::get_user))
                            .route(web::delete().to(user::delete_user)),
                    ),
            )
            .service(
                web::scope("/roles")
                    // /roles
                    .service(
                        web::resource("")
                            .route(web::get().to(role::list_roles))
                            .route(web::post().to(role::create_role))
                            .route(web::patch().to(role::update_role)),
                    )
                    // /roles/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(role::get_role))
                            .route(web::delete().to(role::delete_role)),
                    ),
            ),
    );
}
