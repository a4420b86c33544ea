//! Live tests against the real job server
//!
//! These need a registered user ID in `XRT_USER_ID` (a `.env` file is honoured) and are
//! ignored by default. Run them with:
//!
//! ```sh
//! cargo test --features live-tests --test e2e_live -- --ignored
//! ```

#![cfg(feature = "live-tests")]

mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use xrt_prods::{
    HttpGateway, JobGateway, ProductRequest, Selection, SubmitState, count_active_jobs,
    list_old_jobs,
};

fn live_gateway() -> Option<(String, Arc<dyn JobGateway>)> {
    let settings = match load_live_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("skipping live test: {}", e);
            return None;
        }
    };
    let gateway = HttpGateway::new(settings.config).unwrap();
    Some((settings.user_id, Arc::new(gateway)))
}

#[tokio::test]
#[ignore]
#[serial]
async fn live_account_queries() {
    let Some((user_id, gateway)) = live_gateway() else {
        return;
    };

    let active = count_active_jobs(gateway.as_ref(), &user_id).await.unwrap();
    let jobs = list_old_jobs(gateway.as_ref(), &user_id).await.unwrap();
    println!("{} active jobs, {} previous jobs", active, jobs.len());

    for pair in jobs.windows(2) {
        assert!(pair[0].date_submitted >= pair[1].date_submitted);
    }
}

#[tokio::test]
#[ignore]
#[serial]
async fn live_submit_then_cancel() {
    let Some((user_id, gateway)) = live_gateway() else {
        return;
    };

    let mut request = ProductRequest::new(user_id, gateway).unwrap();
    request.set_global_parameters(grb_globals()).unwrap();
    request.add_light_curve(light_curve()).unwrap();
    request.add_spectrum(spectrum()).unwrap();

    let (ok, explanation) = request.is_valid().into_parts();
    assert!(ok, "{}", explanation);

    let job_id = request.submit().await.unwrap();
    assert_eq!(request.state(), SubmitState::Accepted);
    println!("submitted job {} at {:?}", job_id, request.url());

    request.check_status(Selection::All).await.unwrap();
    let outcome = request.cancel_products(Selection::All).await.unwrap();
    println!("cancel: {:?}", outcome.status);
}
