use super::*;

#[test]
fn empty_request_explains_every_problem() {
    let request = ProductRequest::new(USER, Arc::new(StubGateway::new())).unwrap();
    let (ok, explanation) = request.is_valid().into_parts();

    assert!(!ok);
    assert!(explanation.contains("no products have been added"));
    assert!(explanation.contains("global parameter 'name' is required"));
    assert!(explanation.contains("global parameter 'targ' is required"));
    assert!(explanation.contains("global parameter 'RA' is required"));
}

#[test]
fn missing_product_parameter_is_named_and_fixing_it_flips_the_result() {
    let mut request = draft_with(Arc::new(StubGateway::new()));
    request
        .add_light_curve([("binMeth", json!("counts")), ("pcCounts", json!(20))])
        .unwrap();

    let report = request.is_valid();
    assert!(!report.is_ok());
    assert!(report.explanation().contains("LightCurve parameter 'wtCounts' is required"));
    assert!(report.explanation().contains("LightCurve parameter 'dynamic' is required"));

    let before = request.serialize();
    request
        .set_product_parameters(ProductKind::LightCurve, [("wtCounts", json!(30)), ("dynamic", json!(false))])
        .unwrap();

    assert!(request.is_valid().is_ok());
    let mut expected = before;
    expected["LightCurve"]["wtCounts"] = json!(30);
    expected["LightCurve"]["dynamic"] = json!(false);
    assert_eq!(request.serialize(), expected);
}

#[test]
fn joint_rules_are_checked_at_validation_time() {
    let mut request = draft_with(Arc::new(StubGateway::new()));
    request.add_light_curve(light_curve_pars()).unwrap();
    request
        .set_product_parameters(ProductKind::LightCurve, [("minEnergy", json!(5.0)), ("maxEnergy", json!(2.0))])
        .unwrap();

    let report = request.is_valid();
    assert!(!report.is_ok());
    assert!(report.problems.iter().any(|p| p.starts_with("LightCurve:") && p.contains("minEnergy")));
}

#[test]
fn t0_is_only_required_for_timing_products() {
    let mut request = ProductRequest::new(USER, Arc::new(StubGateway::new())).unwrap();
    let globals: Vec<_> = valid_globals().into_iter().filter(|(name, _)| *name != "T0").collect();
    request.set_global_parameters(globals).unwrap();
    request.add_image([("energies", json!("0.3-10"))]).unwrap();
    assert!(request.is_valid().is_ok());

    request.add_spectrum(spectrum_pars()).unwrap();
    assert!(request.is_valid().explanation().contains("'T0'"));
}

#[test]
fn single_scope_check_ignores_other_scopes() {
    let mut request = draft_with(Arc::new(StubGateway::new()));
    request.add_image(Vec::<(&str, serde_json::Value)>::new()).unwrap();

    assert!(request.is_valid_in(Scope::Global).is_ok());
    assert!(!request.is_valid_in(Scope::Product(ProductKind::Image)).is_ok());
    assert!(!request.is_valid_in(Scope::Product(ProductKind::Spectrum)).is_ok());
}

#[tokio::test]
async fn invalid_request_is_never_sent() {
    let gateway = Arc::new(StubGateway::accepting(42));
    let mut request = draft_with(gateway.clone());
    request.add_light_curve([("binMeth", json!("counts"))]).unwrap();

    let err = request.submit().await.unwrap_err();

    assert!(matches!(err, Error::Validation(ValidationError::Incomplete(_))));
    assert_eq!(request.state(), SubmitState::Draft);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn partial_light_curve_then_fixed_then_accepted() {
    let gateway = Arc::new(StubGateway::accepting(42));
    let mut request = draft_with(gateway.clone());
    request.add_light_curve([("binMeth", json!("counts"))]).unwrap();

    let (ok, explanation) = request.is_valid().into_parts();
    assert!(!ok);
    assert!(explanation.contains("pcCounts"));

    request
        .set_product_parameters(ProductKind::LightCurve, light_curve_pars())
        .unwrap();
    assert!(request.is_valid().is_ok());

    let job_id = request.submit().await.unwrap();

    assert_eq!(job_id, 42);
    assert_eq!(request.job_id(), Some(JobId(42)));
    assert!(request.submitted());
    assert_eq!(request.url(), Some("https://example.org/tprods/42"));

    let err = request.add_spectrum(spectrum_pars()).unwrap_err();
    assert!(is_state_error(&err));
}

#[tokio::test]
async fn submission_sends_nested_parameters_and_resolution_flag() {
    let gateway = Arc::new(StubGateway::accepting(7));
    let mut request = draft_with(gateway.clone());
    request.add_light_curve(light_curve_pars()).unwrap();

    request
        .submit_with(SubmitOptions {
            return_resolved_parameters: false,
        })
        .await
        .unwrap();

    let sent = gateway.submissions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].user_id, USER);
    assert!(!sent[0].return_resolved);
    assert_eq!(sent[0].parameters, request.serialize());
}

#[tokio::test]
async fn every_mutation_fails_after_submission_and_changes_nothing() {
    let (mut request, _gateway) = submitted_with(&[ProductKind::LightCurve], StubGateway::new()).await;
    let before = request.serialize();

    let errors = [
        request.set_global_parameters([("name", json!("Changed"))]).unwrap_err(),
        request.add_spectrum(spectrum_pars()).unwrap_err(),
        request.remove_product(ProductKind::LightCurve).unwrap_err(),
        request
            .set_product_parameters(ProductKind::LightCurve, [("pcCounts", json!(5))])
            .unwrap_err(),
        request.remove_global_parameter("targ").unwrap_err(),
        request
            .from_json(&serde_json::Map::new(), false)
            .unwrap_err(),
    ];

    for err in &errors {
        assert!(is_state_error(err), "expected state error, got {:?}", err);
    }
    assert_eq!(request.serialize(), before);
}

#[tokio::test]
async fn second_submit_is_a_state_error_and_sends_nothing() {
    let (mut request, gateway) = submitted_with(&[ProductKind::Image], StubGateway::new()).await;

    let err = request.submit().await.unwrap_err();

    assert!(matches!(err, Error::State(StateError::NotDraft { .. })));
    assert_eq!(gateway.calls(), vec!["submit"]);
}

#[tokio::test]
async fn rejection_keeps_the_server_explanation() {
    let gateway = Arc::new(StubGateway::new().with_submit(SubmitResponse {
        accepted: false,
        error_message: Some("RA/Dec is not in the XRT field of view".into()),
        ..Default::default()
    }));
    let mut request = draft_with(gateway);
    request.add_image([("energies", json!("0.3-10"))]).unwrap();

    let err = request.submit().await.unwrap_err();

    assert!(matches!(err, Error::ServerRejection(ref m) if m.contains("field of view")));
    assert_eq!(request.state(), SubmitState::Rejected);
    assert_eq!(request.job_id(), None);
    assert!(!request.submitted());
    assert_eq!(request.submit_error(), Some("RA/Dec is not in the XRT field of view"));

    // the rejected request is closed, a redraft is not
    assert!(request.submit().await.is_err());
    let mut retry = request.redraft();
    assert_eq!(retry.state(), SubmitState::Draft);
    assert!(retry.submit_error().is_none());
    assert_eq!(retry.serialize(), request.serialize());
    retry.set_global_parameters([("RA", json!(96.0))]).unwrap();
}

#[tokio::test]
async fn transport_failure_leaves_request_rejected() {
    let gateway = Arc::new(StubGateway::new().failing_submit());
    let mut request = draft_with(gateway);
    request.add_image([("energies", json!("0.3-10"))]).unwrap();

    let err = request.submit().await.unwrap_err();

    assert_eq!(err.code(), "protocol_error");
    assert_eq!(request.state(), SubmitState::Rejected);
    assert!(request.submit_error().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn resolved_parameters_are_folded_back_and_marked() {
    let gateway = StubGateway::new().with_submit(SubmitResponse {
        accepted: true,
        job_id: Some(JobId(99)),
        url: None,
        resolved_parameters: Some(
            json!({
                "name": "GRB 060729",
                "targ": "00221755",
                "RA": 95.37,
                "Dec": -62.37,
                "T0": 175892061.0,
                "poserr": 1.0,
                "lc": 1,
                "lc_binMeth": "counts",
                "lc_pcCounts": 20,
                "lc_wtCounts": 30,
                "lc_dynamic": 1,
                "lc_minen": 0.3,
                "spec": 1,
                "spec_hasRedshift": 0,
                "JobID": 99
            })
            .as_object()
            .cloned()
            .unwrap(),
        ),
        error_message: None,
    });
    let gateway = Arc::new(gateway);
    let mut request = draft_with(gateway);
    request.add_light_curve(light_curve_pars()).unwrap();

    request.submit().await.unwrap();

    let globals = request.global_parameters();
    assert_eq!(globals.get("posErr"), Some(&json!(1.0)));
    assert!(globals.is_auto_filled("posErr"));
    assert!(!globals.is_auto_filled("name"));

    let lc = request.product(ProductKind::LightCurve).unwrap().parameters();
    assert_eq!(lc.get("minEnergy"), Some(&json!(0.3)));
    assert!(lc.is_auto_filled("minEnergy"));
    assert!(!lc.is_auto_filled("pcCounts"));

    // products the caller never asked for are not invented
    assert!(!request.has_product(ProductKind::Spectrum));
    assert_eq!(request.sub_ret_data().unwrap()["JobID"], json!(99));
}

#[tokio::test]
async fn resolved_values_clear_their_derive_flags() {
    let gateway = StubGateway::new().with_submit(SubmitResponse {
        accepted: true,
        job_id: Some(JobId(77)),
        url: None,
        resolved_parameters: Some(
            json!({
                "name": "GRB 060729",
                "getTargs": 1,
                "targ": "00221755",
                "getT0": 1,
                "T0": 175892061.0,
                "RA": 95.37,
                "Dec": -62.37,
                "lc": 1,
                "lc_binMeth": "counts",
                "lc_pcCounts": 20,
                "lc_wtCounts": 30,
                "lc_dynamic": 1
            })
            .as_object()
            .cloned()
            .unwrap(),
        ),
        error_message: None,
    });
    let mut request = ProductRequest::new(USER, Arc::new(gateway)).unwrap();
    request
        .set_global_parameters([
            ("name", json!("GRB 060729")),
            ("getTargs", json!(true)),
            ("getT0", json!(true)),
            ("RA", json!(95.37)),
            ("Dec", json!(-62.37)),
        ])
        .unwrap();
    request.add_light_curve(light_curve_pars()).unwrap();

    request.submit().await.unwrap();

    let globals = request.global_parameters();
    assert!(!globals.is_set("getTargs"));
    assert!(!globals.is_set("getT0"));
    assert!(globals.is_auto_filled("targ"));
    assert!(globals.is_auto_filled("T0"));

    let template = request.redraft();
    let report = template.is_valid();
    assert!(report.is_ok(), "{}", report.explanation());
    assert!(!template.serialize().contains_key("getTargs"));
}
