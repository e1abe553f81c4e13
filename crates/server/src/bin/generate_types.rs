use std::{env, fs, path::PathBuf, process::ExitCode};

use db::models::candidate::CandidateSummary;
use server::routes::health::HealthStatus;
use ts_rs::TS;
use utils::response::ApiResponse;

fn generate_types_content() -> String {
    let decls = [
        CandidateSummary::decl(),
        HealthStatus::decl(),
        ApiResponse::<()>::decl(),
    ];

    let mut out = String::from(
        "// This file was generated by `cargo run --bin generate_types`. Do not edit.\n\n",
    );
    for decl in decls {
        let decl = decl.trim();
        if decl.starts_with("export ") {
            out.push_str(decl);
        } else {
            out.push_str("export ");
            out.push_str(decl);
        }
        out.push_str("\n\n");
    }
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

fn types_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared/types.ts")
}

fn main() -> ExitCode {
    let check = env::args().any(|arg| arg == "--check");
    let path = types_path();
    let content = generate_types_content();

    if check {
        return match fs::read_to_string(&path) {
            Ok(current) if current == content => {
                println!("{} is up to date", path.display());
                ExitCode::SUCCESS
            }
            Ok(_) => {
                eprintln!("{} is stale; run generate_types", path.display());
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("failed to read {}: {e}", path.display());
                ExitCode::FAILURE
            }
        };
    }

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("failed to create {}: {e}", dir.display());
            return ExitCode::FAILURE;
        }
    }
    match fs::write(&path, content) {
        Ok(()) => {
            println!("wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to write {}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}
