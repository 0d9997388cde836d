use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Drop a config template next to the target directory
    let out_dir = env::var("OUT_DIR").unwrap_or_else(|_| "./".to_string());
    let template_path = Path::new(&out_dir).join("../../../config.template.toml");

    let template = r#"# rfbdecode configuration template
# Copy this file to 'rfbdecode.toml' and adjust the values.

# Maximum number of live H.264 decode contexts (1-64)
max_contexts = 64

# Request low-latency decoding from hardware sessions
optimize_for_latency = true
"#;

    let _ = fs::write(template_path, template);
    println!("cargo:rerun-if-changed=build.rs");
}
