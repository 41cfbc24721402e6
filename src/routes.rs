use crate::{
    api::{
        attendance, customers, distributions, fixed_amount, payouts, planned_collections,
        processes, products, received_collections, reports, users, verifications,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    // finish() only fails on a zero period or burst, both clamped here
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request((60_000 / u64::from(requests_per_min)).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();

    Governor::new(&cfg)
}

/// Login sits outside the authenticated scope; everything else under the
/// API prefix goes through `auth_middleware`. Literal segments are
/// registered before `{id}` resources.
pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::resource(format!("{}/users/login", config.api_prefix))
            .wrap(login_limiter)
            .route(web::post().to(handlers::login)),
    );

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/users")
                    .service(web::resource("/logout").route(web::post().to(handlers::logout)))
                    .service(
                        web::resource("/force-logout-all")
                            .route(web::post().to(users::force_logout_all)),
                    )
                    .service(
                        web::resource("/supervisors/list")
                            .route(web::get().to(users::list_supervisors)),
                    )
                    .service(
                        web::resource("/team-members/list")
                            .route(web::get().to(users::list_team_members)),
                    )
                    .service(
                        web::resource("")
                            .route(web::get().to(users::list_users))
                            .route(web::post().to(users::create_user)),
                    )
                    .service(
                        web::resource("/{user_id}")
                            .route(web::get().to(users::get_user))
                            .route(web::put().to(users::update_user))
                            .route(web::delete().to(users::delete_user)),
                    )
                    .service(
                        web::resource("/{user_id}/password")
                            .route(web::put().to(users::set_password)),
                    )
                    .service(
                        web::resource("/{user_id}/force-logout")
                            .route(web::post().to(users::force_logout)),
                    ),
            )
            .service(web::resource("/roles").route(web::get().to(users::list_roles)))
            .service(
                web::scope("/clients")
                    .service(
                        web::resource("")
                            .route(web::get().to(customers::list_customers))
                            .route(web::post().to(customers::create_customer)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(customers::get_customer))
                            .route(web::put().to(customers::update_customer))
                            .route(web::delete().to(customers::delete_customer)),
                    ),
            )
            .service(
                web::scope("/products")
                    .service(
                        web::resource("")
                            .route(web::get().to(products::list_products))
                            .route(web::post().to(products::create_product)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(products::delete_product)),
                    ),
            )
            .service(
                web::scope("/process")
                    .service(
                        web::resource("")
                            .route(web::get().to(processes::list_processes))
                            .route(web::post().to(processes::create_process)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(processes::get_process))
                            .route(web::put().to(processes::update_process))
                            .route(web::delete().to(processes::delete_process)),
                    ),
            )
            .service(
                web::scope("/verifications")
                    .service(
                        web::resource("")
                            .route(web::get().to(verifications::list_verifications))
                            .route(web::post().to(verifications::create_verification)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(verifications::update_verification))
                            .route(web::delete().to(verifications::delete_verification)),
                    ),
            )
            .service(
                web::scope("/payout-verifications")
                    .service(
                        web::resource("")
                            .route(web::get().to(payouts::list_case_entries))
                            .route(web::post().to(payouts::create_case_entry)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(payouts::update_case_entry))
                            .route(web::delete().to(payouts::delete_case_entry)),
                    ),
            )
            .service(
                web::scope("/planned-collections")
                    .service(
                        web::resource("/recived")
                            .route(web::get().to(received_collections::list_received))
                            .route(web::post().to(received_collections::create_received)),
                    )
                    .service(
                        web::resource("/recived/{id}")
                            .route(web::put().to(received_collections::update_received))
                            .route(web::delete().to(received_collections::delete_received)),
                    )
                    .service(
                        web::resource("/summary").route(web::get().to(reports::collection_summary)),
                    )
                    .service(web::resource("/months").route(web::get().to(reports::list_months)))
                    .service(
                        web::resource("/distributions")
                            .route(web::get().to(distributions::list_distributions))
                            .route(web::post().to(distributions::create_distribution)),
                    )
                    .service(
                        web::resource("/distribution/{id}")
                            .route(web::get().to(distributions::get_distribution))
                            .route(web::put().to(distributions::update_distribution))
                            .route(web::delete().to(distributions::delete_distribution)),
                    )
                    .service(
                        web::resource("")
                            .route(web::get().to(planned_collections::list_planned))
                            .route(web::post().to(planned_collections::create_planned)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(planned_collections::update_planned))
                            .route(web::delete().to(planned_collections::delete_planned)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/import")
                            .route(web::post().to(attendance::import_attendance)),
                    )
                    .service(
                        web::resource("/export")
                            .route(web::get().to(attendance::export_attendance)),
                    )
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance))
                            .route(web::post().to(attendance::create_attendance)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(attendance::get_attendance))
                            .route(web::put().to(attendance::update_attendance)),
                    ),
            )
            .service(
                web::resource("/fixed-amount")
                    .route(web::get().to(fixed_amount::list_fixed_amounts))
                    .route(web::post().to(fixed_amount::set_fixed_amount)),
            )
            .service(web::resource("/reports/dashboard").route(web::get().to(reports::dashboard))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, test};

    #[actix_web::test]
    async fn limiter_admits_the_burst_then_throttles() {
        let app = test::init_service(
            App::new()
                .wrap(build_limiter(2))
                .route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let peer = "127.0.0.1:4000".parse().unwrap();
        for _ in 0..2 {
            let req = test::TestRequest::get().uri("/ping").peer_addr(peer).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 200);
        }

        let req = test::TestRequest::get().uri("/ping").peer_addr(peer).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 429);
    }
}
