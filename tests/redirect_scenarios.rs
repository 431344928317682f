//! End-to-end redirect behavior against the simulated host

use pretty_assertions::assert_eq;

use url_redirector::prelude::*;
use url_redirector::replay::{parse_line, SimulatedHost, TraceEvent};

const APP: &str = "app.browser";
const FIELD: &str = "app.browser:id/url";

fn scenario_config() -> RedirectorConfig {
    RedirectorConfig {
        browsers: vec![BrowserEntry::new(APP, FIELD)],
        rules: vec![RewriteRule::new("google.com", "zarebin.ir")],
        ..Default::default()
    }
}

fn direct_redirector(config: RedirectorConfig) -> Redirector<SimulatedHost> {
    let host = SimulatedHost::direct();
    let clipboard = host.clipboard();
    Redirector::with_host(host, Some(clipboard), config).unwrap()
}

fn feed(redirector: &mut Redirector<SimulatedHost>, trace: &TraceEvent) -> HandleOutcome {
    let event = redirector.tree().materialize(trace);
    redirector.handle(event)
}

fn address_bar_event(app: &str, field: &str, t: u64, url: &str) -> TraceEvent {
    TraceEvent::content_changed(app, t)
        .in_text_input()
        .with_field(field, Some(url))
}

#[test]
fn test_scenario_inject_debounce_inject() {
    let mut redirector = direct_redirector(scenario_config());

    feed(&mut redirector, &address_bar_event(APP, FIELD, 1000, "http://google.com"));
    assert_eq!(redirector.tree().field_text(FIELD).as_deref(), Some("http://zarebin.ir"));

    feed(&mut redirector, &address_bar_event(APP, FIELD, 1500, "http://google.com"));
    assert_eq!(redirector.tree().field_text(FIELD).as_deref(), Some("http://google.com"));

    feed(&mut redirector, &address_bar_event(APP, FIELD, 5000, "http://google.com/x"));
    assert_eq!(redirector.tree().field_text(FIELD).as_deref(), Some("http://zarebin.ir/x"));

    let log = redirector.tree().log();
    assert_eq!(
        log.injected_texts(),
        vec!["http://zarebin.ir".to_string(), "http://zarebin.ir/x".to_string()]
    );
    assert!(log.all_released_once());
    assert_eq!(redirector.stats().debounced, 1);
}

#[test]
fn test_every_default_browser_is_debounced() {
    for browser in BrowserRegistry::default().list_browsers() {
        let mut redirector = direct_redirector(RedirectorConfig::default());
        let app = browser.application_id.as_str();
        let field = browser.address_field_id.as_str();

        feed(&mut redirector, &address_bar_event(app, field, 20_000, "https://google.com/?q=a"));
        feed(&mut redirector, &address_bar_event(app, field, 20_500, "https://google.com/?q=a"));
        assert_eq!(redirector.stats().injection_attempts(), 1, "{app}");

        feed(&mut redirector, &address_bar_event(app, field, 22_501, "https://google.com/?q=a"));
        assert_eq!(redirector.stats().injection_attempts(), 2, "{app}");
    }
}

#[test]
fn test_non_matching_urls_never_inject() {
    let mut redirector = direct_redirector(scenario_config());

    for t in [1000, 1001, 2500, 4000, 20_000] {
        feed(&mut redirector, &address_bar_event(APP, FIELD, t, "https://example.org/google"));
    }

    assert!(redirector.tree().log().injected_texts().is_empty());
    assert_eq!(redirector.tracked_detections(), 1);
    assert_eq!(redirector.stats().no_rule_match, 3);
    assert_eq!(redirector.stats().debounced, 2);
}

#[test]
fn test_untracked_application_never_reaches_the_tree() {
    let mut redirector = direct_redirector(scenario_config());

    for t in [1000, 5000] {
        let outcome = feed(
            &mut redirector,
            &address_bar_event("com.example.notes", FIELD, t, "http://google.com"),
        );
        assert_eq!(outcome, HandleOutcome::UnknownApplication);
    }

    let log = redirector.tree().log();
    assert_eq!(log.find_calls, 0);
    assert!(log.actions.is_empty());
}

#[test]
fn test_handles_released_once_on_every_path() {
    let mut redirector = direct_redirector(scenario_config());
    let traces = vec![
        // injected
        address_bar_event(APP, FIELD, 1000, "http://google.com"),
        // debounced
        address_bar_event(APP, FIELD, 1100, "http://google.com"),
        // no rule match
        address_bar_event(APP, FIELD, 1200, "http://example.org"),
        // no address bar
        TraceEvent::content_changed(APP, 1300).in_text_input(),
        // not a text input
        TraceEvent::content_changed(APP, 1400).with_field(FIELD, Some("http://google.com/y")),
    ];
    for trace in &traces {
        feed(&mut redirector, trace);
    }

    // injection error path
    redirector.tree().fail_injection(true);
    let outcome = feed(&mut redirector, &address_bar_event(APP, FIELD, 1500, "http://google.com/z"));
    assert!(matches!(outcome, HandleOutcome::InjectionFailed { .. }));

    let log = redirector.tree().log();
    assert!(log.all_released_once());
    assert_eq!(redirector.stats().events_seen, 6);
}

#[test]
fn test_clipboard_host_scenario() {
    let host = SimulatedHost::clipboard_only();
    let clipboard = host.clipboard();
    clipboard.preset(Some("notes"));
    let mut redirector = Redirector::with_host(host, Some(clipboard.clone()), scenario_config()).unwrap();

    feed(&mut redirector, &address_bar_event(APP, FIELD, 1000, "http://google.com"));

    assert_eq!(redirector.strategy(), InjectionStrategy::ClipboardRelay);
    assert_eq!(redirector.tree().log().injected_texts(), vec!["http://zarebin.ir".to_string()]);
    assert_eq!(redirector.tree().field_text(FIELD).as_deref(), Some("http://zarebin.ir"));
    assert_eq!(clipboard.current().as_deref(), Some("notes"));
}

#[test]
fn test_sample_trace_replay() {
    let host = SimulatedHost::direct();
    let clipboard = host.clipboard();
    let config = RedirectorConfig::from_json_str(include_str!("../demos/config.json")).unwrap();
    let mut redirector = Redirector::with_host(host, Some(clipboard), config).unwrap();

    let mut outcomes = Vec::new();
    for line in include_str!("../demos/sample_trace.jsonl").lines() {
        if let Some(trace) = parse_line(line).unwrap() {
            outcomes.push(feed(&mut redirector, &trace));
        }
    }

    assert_eq!(outcomes.len(), 6);
    assert_eq!(
        redirector.tree().field_text("com.android.chrome:id/url_bar").as_deref(),
        Some("https://zarebin.ir/maps")
    );
    assert_eq!(
        redirector.tree().log().injected_texts(),
        vec![
            "https://zarebin.ir/search?q=rust".to_string(),
            "https://zarebin.ir/maps".to_string(),
        ]
    );
    assert_eq!(outcomes[2], HandleOutcome::NoUrl);
    assert_eq!(outcomes[3], HandleOutcome::UnknownApplication);
    assert_eq!(
        outcomes[4],
        HandleOutcome::NoRuleMatch { url: "https://www.rust-lang.org".into() }
    );
}
