use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Resource folders the binary looks for next to itself.
const RESOURCE_DIRS: &[&str] = &["resources/images", "resources/data"];

fn main() {
    let Some(target_dir) = target_dir() else {
        println!("cargo:warning=Could not locate the target directory, resources were not copied");
        return;
    };

    for dir in RESOURCE_DIRS {
        let src = Path::new(dir);
        if src.exists() {
            copy_dir_recursive(src, &target_dir.join(dir));
            println!("cargo:rerun-if-changed={}/", dir);
        }
    }

    let config_src = Path::new("config.json");
    if config_src.exists() {
        let _ = fs::copy(config_src, target_dir.join("config.json"));
        println!("cargo:rerun-if-changed=config.json");
    }
}

/// target/<profile>, three levels above OUT_DIR (out -> hash -> build).
fn target_dir() -> Option<PathBuf> {
    let out_dir = env::var("OUT_DIR").ok()?;
    Path::new(&out_dir).ancestors().nth(3).map(Path::to_path_buf)
}

fn copy_dir_recursive(src: &Path, dst: &Path) {
    let _ = fs::create_dir_all(dst);

    let Ok(entries) = fs::read_dir(src) else {
        return;
    };
    for entry in entries.flatten() {
        let src_path = entry.path();
        let Some(file_name) = src_path.file_name() else {
            continue;
        };
        let dst_path = dst.join(file_name);
        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path);
        } else {
            let _ = fs::copy(&src_path, &dst_path);
        }
    }
}
