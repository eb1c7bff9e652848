#![no_main]

use libfuzzer_sys::fuzz_target;
use php_rs_parser::{parse_with, Dialect, ParserConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    for dialect in [Dialect::Php5, Dialect::Php7] {
        let config = ParserConfig {
            dialect,
            ..ParserConfig::default()
        };
        let result = parse_with(source, config);
        // Recovered syntax errors lower to placeholder nodes, so lowering
        // parser output never faults.
        let lowered = php_ir::lower(result.root);
        match lowered {
            Ok(root) => {
                php_ir::fmt::print_root(&root);
            }
            Err(err) => panic!("{err}"),
        }
    }
});
