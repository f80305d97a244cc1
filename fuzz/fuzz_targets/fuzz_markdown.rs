#![no_main]

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use libfuzzer_sys::fuzz_target;
use outline_engine::documents::DocumentHandle;
use outline_engine::generators::markdown::MarkdownGenerator;
use outline_engine::generators::{GeneratorOptions, OutlineGenerator};

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let document =
            DocumentHandle::with_payload("fuzz.md", Arc::new(RwLock::new(content.to_string())));
        let generator = MarkdownGenerator::new();
        let options = GeneratorOptions::default();

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            generator.generate(&document, &options)
        }));

        if let Ok(Ok(headings)) = result {
            let line_count = content.lines().count() as u64;

            for heading in &headings {
                assert!(heading.level >= 1, "level must be at least 1");
                assert!(
                    heading.level <= options.max_depth,
                    "level must respect max_depth"
                );

                let line = heading.extras["line"]
                    .as_u64()
                    .expect("every heading carries a line extra");
                assert!(line < line_count, "line index out of range");

                let slug = heading.extras["slug"]
                    .as_str()
                    .expect("every heading carries a slug extra");
                assert!(
                    !slug.chars().any(char::is_whitespace),
                    "slug must not contain whitespace"
                );
            }
        }
    }
});
