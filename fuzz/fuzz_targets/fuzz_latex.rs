#![no_main]

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use libfuzzer_sys::fuzz_target;
use outline_engine::documents::DocumentHandle;
use outline_engine::generators::latex::LatexGenerator;
use outline_engine::generators::{GeneratorOptions, OutlineGenerator};

const COMMANDS: &[&str] = &[
    "part",
    "chapter",
    "section",
    "subsection",
    "subsubsection",
    "paragraph",
    "subparagraph",
];

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let document =
            DocumentHandle::with_payload("fuzz.tex", Arc::new(RwLock::new(content.to_string())));
        // Depth 7 admits every sectioning command; numbering exercises the
        // counter against arbitrary level sequences.
        let options = GeneratorOptions {
            max_depth: 7,
            numbered: true,
        };
        let generator = LatexGenerator::with_options(options.clone());

        let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
            generator.generate(&document, &options)
        }));

        if let Ok(Ok(headings)) = result {
            let line_count = content.lines().count() as u64;

            for heading in &headings {
                assert!(
                    heading.level >= 1 && heading.level <= 7,
                    "level must match a sectioning command rank"
                );

                let line = heading.extras["line"]
                    .as_u64()
                    .expect("every heading carries a line extra");
                assert!(line < line_count, "line index out of range");

                let command = heading.extras["command"]
                    .as_str()
                    .expect("every heading carries a command extra");
                assert!(
                    COMMANDS.contains(&command),
                    "command extra must name a sectioning command"
                );
            }
        }
    }
});
