//! Shared fixtures for integration tests.
//!
//! Mach-O images are assembled byte by byte so the tests run on any host
//! and pin the exact load commands the scanner sees.


use std::fs;
use std::path::{Path, PathBuf};

pub use hijackscan::codesign::entitlements::{
    ALLOW_DYLD_ENVIRONMENT_VARIABLES, DISABLE_LIBRARY_VALIDATION,
};
pub use macho_builder::{fat, MachOBuilder};

/// Info.plist naming `executable` as the bundle's main binary.
pub fn info_plist(executable: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleExecutable</key>
    <string>{executable}</string>
    <key>CFBundleIdentifier</key>
    <string>com.example.{executable}</string>
</dict>
</plist>
"#
    )
}

/// Create `<root>/<name>.app` with a manifest and the given executable image.
pub fn write_app(root: &Path, name: &str, image: &[u8]) -> PathBuf {
    let bundle = root.join(format!("{name}.app"));
    let macos = bundle.join("Contents").join("MacOS");
    fs::create_dir_all(&macos).unwrap();
    fs::write(bundle.join("Contents").join("Info.plist"), info_plist(name)).unwrap();
    fs::write(macos.join(name), image).unwrap();
    bundle
}

/// Create an empty file, making intermediate directories.
pub fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

/// Entitlements plist with the given boolean keys set to true.
pub fn entitlements(keys: &[&str]) -> String {
    let mut body = String::new();
    for key in keys {
        body.push_str(&format!("    <key>{key}</key>\n    <true/>\n"));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plist version=\"1.0\">\n<dict>\n{body}</dict>\n</plist>\n"
    )
}
