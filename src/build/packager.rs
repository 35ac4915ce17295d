//! PyInstaller invocation.

use crate::process::Cmd;

use super::layout::BuildLayout;
use super::venv::Activation;

/// Module name passed to `python -m`.
pub const PACKAGER_MODULE: &str = "PyInstaller";

/// Build the one-file packaging command for `layout`.
///
/// All output locations are passed explicitly so nothing lands outside the
/// paths the cleanup step knows about.
pub fn package_command(activation: &Activation<'_>, layout: &BuildLayout, extra: &[String]) -> Cmd {
    activation
        .python()
        .args(["-m", PACKAGER_MODULE, "--onefile", "--noconfirm", "--name"])
        .arg(&layout.stem)
        .arg("--distpath")
        .arg_path(&layout.dist_dir)
        .arg("--workpath")
        .arg_path(&layout.build_dir)
        .arg("--specpath")
        .arg_path(&layout.work_dir)
        .args(extra)
        .arg_path(&layout.entry)
        .dir(&layout.work_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::venv::VirtualEnv;
    use crate::config::Config;
    use std::collections::HashMap;
    use std::path::Path;

    #[cfg(unix)]
    #[test]
    fn test_one_file_command_line() {
        let config = Config::from_vars(Path::new("/work"), &HashMap::new()).unwrap();
        let layout = BuildLayout::new(&config, Path::new("diffxl.py")).unwrap();
        let env = VirtualEnv::open(&config.env_dir);
        let activation = env.activate().unwrap();

        let line = package_command(&activation, &layout, &["--clean".to_string()]).display();
        assert!(line.contains(
            "-m PyInstaller --onefile --noconfirm --name diffxl --distpath /work/dist --workpath /work/build --specpath /work --clean /work/diffxl.py"
        ));
    }
}
