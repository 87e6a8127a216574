// build.rs

use glob::glob;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A point set instance found under `data/points/`.
#[derive(Debug)]
struct PointSetInstance {
    pub name: String,
    pub path: PathBuf,
}

/// Discovers all point set instances by scanning the `data/points/` directory.
fn get_all_instances(manifest_dir: &Path) -> Vec<PointSetInstance> {
    let pattern = manifest_dir.join("data/points/*.csv");
    glob(&pattern.to_string_lossy())
        .expect("Failed to read glob pattern")
        .filter_map(Result::ok)
        .filter_map(|path| {
            let name = path
                .file_stem()?
                .to_string_lossy()
                .replace(|c: char| !c.is_ascii_alphanumeric(), "_")
                .to_lowercase();
            Some(PointSetInstance { name, path })
        })
        .collect()
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("point_set_tests.rs");
    let mut file = BufWriter::new(File::create(&dest_path).unwrap());

    println!("cargo:rerun-if-changed=data/points");

    // Generate a separate `#[test]` function for each instance.
    for instance in get_all_instances(&manifest_dir) {
        let path_str = instance.path.to_str().unwrap();
        writeln!(
            file,
            r#"
#[test]
fn point_set_{name}() -> anyhow::Result<()> {{
    run_point_set_checks("{name}", "{path}")
}}
"#,
            name = instance.name,
            path = path_str.escape_default()
        )
        .unwrap();
    }
}
