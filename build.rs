use std::process::Command;

fn main() {
    // Git commit hash（短）
    let commit = command_output("git", &["rev-parse", "--short", "HEAD"]);

    // 构建时间（UTC），构建脚本里不引入 chrono
    let build_time = command_output("date", &["-u", "+%Y-%m-%dT%H:%M:%SZ"]);

    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=ADMINUI_GIT_COMMIT={commit}");
    println!("cargo:rustc-env=ADMINUI_BUILD_TIME={build_time}");
    println!("cargo:rustc-env=ADMINUI_BUILD_TARGET={target}");
    println!("cargo:rustc-env=ADMINUI_BUILD_PROFILE={profile}");

    // 仅在 git HEAD 变化时重新运行
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
}

/// 运行命令取 stdout，失败时为 "unknown"
fn command_output(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
