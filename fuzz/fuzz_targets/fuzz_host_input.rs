#![no_main]

use libfuzzer_sys::fuzz_target;
use secnav_core::SectionRegistry;
use secnav_runtime::NavigatorConfig;
use secnav_web::StepNavigator;
use secnav_web::input_parser::{commands_to_json, parse_host_input};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 8192 {
        return;
    }

    // Parsing must never panic; errors are fine.
    let Ok(Some(input)) = parse_host_input(text) else {
        return;
    };

    let Ok(registry) = SectionRegistry::from_pairs([
        ("intro", "nav.intro"),
        ("work", "nav.work"),
        ("contact", "nav.contact"),
    ]) else {
        return;
    };
    let mut nav = StepNavigator::new(registry, NavigatorConfig::default());
    nav.mount(None);
    nav.push_input(input);
    nav.step();

    let active = nav.current_active_id();
    assert!(active.is_some_and(|id| nav.navigator().registry().contains(id.as_str())));
    assert!(commands_to_json(&nav.drain_commands()).is_ok());
});
