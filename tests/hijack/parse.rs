use crate::common::{
    entitlements, fat, MachOBuilder, ALLOW_DYLD_ENVIRONMENT_VARIABLES, DISABLE_LIBRARY_VALIDATION,
};
use hijackscan::io::IoLimits;
use hijackscan::macho::{parse_slices, MachOParser, ObjectMachOParser};
use hijackscan::{HijackError, LoadDirective};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_thin_image_load_commands() {
    let image = MachOBuilder::arm64()
        .dylinker("/usr/lib/dyld")
        .rpath("@executable_path/../Frameworks")
        .dylib("@rpath/Sparkle.framework/Versions/B/Sparkle")
        .dylib("/usr/lib/libSystem.B.dylib")
        .rpath("/opt/homebrew/lib")
        .weak_dylib("/Library/Plugins/libopt.dylib")
        .build();

    let slices = parse_slices(&image).unwrap();
    assert_eq!(slices.len(), 1);
    let slice = &slices[0];

    assert_eq!(slice.arch_name(), "arm64");
    assert_eq!(slice.dylinker.as_deref(), Some("/usr/lib/dyld"));
    assert_eq!(
        slice.runtime_search_paths,
        vec!["@executable_path/../Frameworks", "/opt/homebrew/lib"]
    );
    assert_eq!(
        slice.library_loads,
        vec![
            LoadDirective {
                name: "@rpath/Sparkle.framework/Versions/B/Sparkle".into(),
                timestamp: 2,
                current_version: "1.2.3".into(),
                compatibility_version: "1.0.0".into(),
            },
            LoadDirective {
                name: "/usr/lib/libSystem.B.dylib".into(),
                timestamp: 2,
                current_version: "1.2.3".into(),
                compatibility_version: "1.0.0".into(),
            },
        ]
    );
    assert_eq!(slice.weak_library_loads.len(), 1);
    assert_eq!(slice.weak_library_loads[0].name, "/Library/Plugins/libopt.dylib");

    // unsigned
    assert_eq!(slice.code_sign_flags, 0);
    assert!(!slice.library_validation_disabled);
}

#[test]
fn test_signature_flags_and_entitlements() {
    let ents = entitlements(&[DISABLE_LIBRARY_VALIDATION, ALLOW_DYLD_ENVIRONMENT_VARIABLES]);
    let image = MachOBuilder::x86_64()
        .dylib("/usr/lib/libSystem.B.dylib")
        .signed(0x10000, Some(&ents))
        .build();

    let slice = &parse_slices(&image).unwrap()[0];
    assert_eq!(slice.arch_name(), "x86_64");
    assert_eq!(slice.code_sign_flags, 0x10000);
    assert!(slice.library_validation_disabled);
    assert!(slice.allow_dyld_environment_variables);
}

#[test]
fn test_signature_without_entitlements() {
    let image = MachOBuilder::arm64().signed(0x12000, None).build();
    let slice = &parse_slices(&image).unwrap()[0];
    assert_eq!(slice.code_sign_flags, 0x12000);
    assert!(!slice.library_validation_disabled);
    assert!(!slice.allow_dyld_environment_variables);
}

#[test]
fn test_malformed_entitlements_read_as_empty() {
    let image = MachOBuilder::arm64()
        .signed(0x10000, Some("<plist><dict><key>unterminated"))
        .build();
    let slice = &parse_slices(&image).unwrap()[0];
    assert_eq!(slice.code_sign_flags, 0x10000);
    assert!(!slice.library_validation_disabled);
}

#[test]
fn test_fat_image_slices_in_header_order() {
    let image = fat(&[
        MachOBuilder::x86_64()
            .dylib("/usr/lib/libSystem.B.dylib")
            .signed(0x12000, None),
        MachOBuilder::arm64().weak_dylib("/opt/libweak.dylib"),
    ]);

    let slices = parse_slices(&image).unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].arch_name(), "x86_64");
    assert_eq!(slices[0].code_sign_flags, 0x12000);
    assert_eq!(slices[0].library_loads.len(), 1);
    assert_eq!(slices[1].arch_name(), "arm64");
    assert_eq!(slices[1].code_sign_flags, 0);
    assert_eq!(slices[1].weak_library_loads[0].name, "/opt/libweak.dylib");
}

#[test]
fn test_truncated_image_rejected() {
    let image = MachOBuilder::arm64()
        .dylib("/usr/lib/libSystem.B.dylib")
        .rpath("/opt/lib")
        .build();
    assert!(parse_slices(&image[..40]).is_err());
}

#[test]
fn test_signature_past_end_rejected() {
    let image = MachOBuilder::arm64().signed(0, None).build();
    let cut = image.len() - 8;
    assert!(parse_slices(&image[..cut]).is_err());
}

#[test]
fn test_parser_reads_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Demo");
    fs::write(&path, MachOBuilder::arm64().dylib("/opt/libdemo.dylib").build()).unwrap();

    let slices = ObjectMachOParser::default().parse(&path).unwrap();
    assert_eq!(slices[0].library_loads[0].name, "/opt/libdemo.dylib");
}

#[test]
fn test_parser_failures_are_parse_failures() {
    let dir = TempDir::new().unwrap();

    let script = dir.path().join("launcher");
    fs::write(&script, b"#!/bin/sh\nexec \"$0.real\" \"$@\"\n").unwrap();
    let err = ObjectMachOParser::default().parse(&script).unwrap_err();
    assert!(matches!(err, HijackError::ParseFailure { .. }));

    let empty = dir.path().join("empty");
    fs::write(&empty, b"").unwrap();
    let err = ObjectMachOParser::default().parse(&empty).unwrap_err();
    assert!(matches!(err, HijackError::ParseFailure { .. }));

    let big = dir.path().join("big");
    fs::write(&big, MachOBuilder::arm64().dylib("/opt/lib.dylib").build()).unwrap();
    let limited = ObjectMachOParser::new(IoLimits { max_file_size: 16 });
    let err = limited.parse(&big).unwrap_err();
    assert!(matches!(err, HijackError::ParseFailure { .. }));
}
