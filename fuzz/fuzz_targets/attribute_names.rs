#![no_main]

use libfuzzer_sys::fuzz_target;
use trustgraph::attribute::{Attribute, AttributeRegistry};

fuzz_target!(|data: &[u8]| {
    // Interning must be total for any name, and agree with lookup afterwards
    if let Ok(input) = std::str::from_utf8(data) {
        let registry = AttributeRegistry::new();
        let attribute = registry.intern(input);
        assert_ne!(attribute, Attribute::NON_EXISTING);
        assert_eq!(registry.intern(input), attribute);

        let base = input.split(';').next().unwrap_or("");
        assert_eq!(registry.lookup(base), attribute);
        let _ = registry.display(attribute);
        let _ = registry.is_meta(attribute);
    }
});
