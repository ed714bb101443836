mod common;

use std::fs;

use common::{Synthetic, V14_FILE_LEN, V15_FILE_LEN, lua};
use pluto_core::schema::schema_for;
use pluto_core::{
    ErrorKind, LuaCodec, LuaKey, LuaValue, SaveContainer, SaveError, SaveVersion, SectionId,
    describe_layout, detect,
};

fn mixed_blob() -> Vec<u8> {
    lua::table(&[
        (lua::number(2.0), lua::string("second")),
        (lua::string("name"), lua::string("Zagreus")),
        (lua::number(1.0), lua::string("first")),
        (
            lua::string("flags"),
            lua::table(&[(lua::string("HardMode"), lua::boolean(false))]),
        ),
        (lua::number(-7.0), vec![b'-']),
    ])
}

#[test]
fn every_version_rebuilds_byte_for_byte() {
    for version in [14, 15, 16] {
        let bytes = Synthetic::new(version, mixed_blob()).file();
        let container = SaveContainer::from_bytes(&bytes)
            .unwrap_or_else(|e| panic!("version {version} failed to load: {e}"));
        assert_eq!(container.version().raw(), version);
        assert_eq!(container.to_bytes().unwrap(), bytes, "version {version}");
    }
}

#[test]
fn schema_parse_then_build_is_identity() {
    for version in SaveVersion::ALL {
        let content = Synthetic::new(version.raw(), mixed_blob()).content();
        let schema = schema_for(version);
        let record = schema.parse(&content).unwrap();
        assert_eq!(record.consumed, content.len());
        assert_eq!(schema.build(&record.header, record.blob).unwrap(), content);

        let codec = LuaCodec::new();
        let tree = codec.decode(record.blob).unwrap();
        assert_eq!(codec.encode(&tree).unwrap(), record.blob);
    }
}

#[test]
fn padded_versions_have_exact_length() {
    let v14 = SaveContainer::from_bytes(&Synthetic::new(14, lua::darkness(1.0)).file()).unwrap();
    assert_eq!(v14.to_bytes().unwrap().len(), V14_FILE_LEN);
    let v15 = SaveContainer::from_bytes(&Synthetic::new(15, lua::darkness(1.0)).file()).unwrap();
    assert_eq!(v15.to_bytes().unwrap().len(), V15_FILE_LEN);

    let v16 = Synthetic::new(16, lua::darkness(1.0));
    let container = SaveContainer::from_bytes(&v16.file()).unwrap();
    assert_eq!(container.to_bytes().unwrap().len(), v16.content().len());
}

#[test]
fn header_fields_follow_the_version() {
    let v14 = SaveContainer::from_bytes(&Synthetic::new(14, lua::darkness(1.0)).file()).unwrap();
    let header = v14.header();
    assert_eq!(header.timestamp, None);
    assert_eq!(header.active_shrine_points, None);
    assert_eq!(header.hell_mode_enabled, None);
    assert_eq!(header.location, "Tartarus");
    assert_eq!(header.lua_key("LastSave"), Some("RoomOpening"));

    let v16 = SaveContainer::from_bytes(&Synthetic::new(16, lua::darkness(1.0)).file()).unwrap();
    let header = v16.header();
    assert_eq!(header.timestamp, Some(1_700_000_000));
    assert_eq!(header.active_shrine_points, Some(4));
    assert_eq!(header.hell_mode_enabled, Some(false));
    assert_eq!(header.start_next_map, "A_Intro");
}

#[test]
fn table_order_survives_decode_and_encode() {
    let bytes = Synthetic::new(16, mixed_blob()).file();
    let container = SaveContainer::from_bytes(&bytes).unwrap();
    let keys: Vec<String> = container
        .root()
        .as_table()
        .unwrap()
        .keys()
        .map(ToString::to_string)
        .collect();
    assert_eq!(keys, ["2", "name", "1", "flags", "-7"]);
}

#[test]
fn end_to_end_edit_of_a_version_16_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Profile1.sav");
    let mut synthetic = Synthetic::new(16, lua::darkness(1500.0));
    synthetic.location = "Tartarus";
    synthetic.runs = 3;
    synthetic.god_mode = true;
    fs::write(&path, synthetic.file()).unwrap();

    let darkness = [LuaKey::from("darkness")];
    let mut container = SaveContainer::load(&path).unwrap();
    assert_eq!(container.get(&darkness).unwrap(), &LuaValue::Number(1500.0));

    container.set(&darkness, LuaValue::Number(2000.0)).unwrap();
    container.save(&path).unwrap();
    assert!(!dir.path().join("Profile1.sav.tmp").exists());

    let reloaded = SaveContainer::load(&path).unwrap();
    assert_eq!(reloaded.get(&darkness).unwrap(), &LuaValue::Number(2000.0));
    assert_eq!(reloaded.header(), container.header());
    assert_eq!(reloaded.header().location, "Tartarus");
    assert_eq!(reloaded.header().runs, 3);
    assert!(reloaded.header().god_mode_enabled);
}

#[test]
fn load_save_load_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    for version in [14, 15, 16] {
        let path = dir.path().join(format!("v{version}.sav"));
        fs::write(&path, Synthetic::new(version, mixed_blob()).file()).unwrap();

        let first = SaveContainer::load(&path).unwrap();
        first.save(&path).unwrap();
        let second = SaveContainer::load(&path).unwrap();
        assert_eq!(first, second, "version {version}");
    }
}

#[test]
fn corrupted_version_marker_is_unsupported() {
    let mut bytes = Synthetic::new(16, lua::darkness(1.0)).file();
    bytes[4] = 0x7f;
    assert_eq!(detect(&bytes).unwrap_err().kind(), ErrorKind::UnsupportedVersion);
    assert_eq!(
        SaveContainer::from_bytes(&bytes).unwrap_err().kind(),
        ErrorKind::UnsupportedVersion
    );
}

#[test]
fn truncated_files_are_rejected() {
    let bytes = Synthetic::new(16, lua::darkness(1.0)).file();
    for len in [0, 3, 7, 20, 60] {
        assert_eq!(
            SaveContainer::from_bytes(&bytes[..len]).unwrap_err().kind(),
            ErrorKind::TruncatedInput,
            "length {len}"
        );
    }

    let content = Synthetic::new(15, lua::darkness(1.0)).content();
    assert_eq!(
        SaveContainer::from_bytes(&content).unwrap_err().kind(),
        ErrorKind::TruncatedInput
    );
}

#[test]
fn padding_tail_must_be_zero() {
    let synthetic = Synthetic::new(14, lua::darkness(1.0));
    let mut bytes = synthetic.file();
    let offset = synthetic.content().len() + 10;
    bytes[offset] = 1;
    let err = SaveContainer::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, SaveError::NonZeroPadding { offset: o } if o == offset));

    let mut long = synthetic.file();
    long.push(0);
    assert_eq!(
        SaveContainer::from_bytes(&long).unwrap_err().kind(),
        ErrorKind::PayloadTooLarge
    );
}

#[test]
fn blob_errors_surface_from_load() {
    let mut bad_tag = lua::darkness(1.0);
    bad_tag[0] = b'X';
    let err = SaveContainer::from_bytes(&Synthetic::new(16, bad_tag).file()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownTag);

    let mut trailing = lua::darkness(1.0);
    trailing.push(b'-');
    let err = SaveContainer::from_bytes(&Synthetic::new(15, trailing).file()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TrailingBytes);

    let mut deep = Vec::new();
    for _ in 0..300 {
        deep.push(b'T');
        deep.extend_from_slice(&lua::number(1.0));
    }
    deep.push(b'-');
    deep.extend(std::iter::repeat_n(b'E', 300));
    let err = SaveContainer::from_bytes(&Synthetic::new(16, deep).file()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecursionLimitExceeded);
}

#[test]
fn oversized_header_strings_fail_on_build() {
    let mut container =
        SaveContainer::from_bytes(&Synthetic::new(14, lua::darkness(1.0)).file()).unwrap();
    container.header_mut().location = "L".repeat(33);
    let err = container.to_bytes().unwrap_err();
    assert!(matches!(
        err,
        SaveError::FieldOverflow {
            field: "location",
            len: 33,
            max: 32
        }
    ));

    container.header_mut().location = "Asphodel".to_string();
    container.header_mut().active_shrine_points = Some(1);
    assert_eq!(container.to_bytes().unwrap_err().kind(), ErrorKind::InvalidField);
}

#[test]
fn oversized_content_cannot_be_padded() {
    let mut container =
        SaveContainer::from_bytes(&Synthetic::new(14, lua::darkness(1.0)).file()).unwrap();
    let huge = LuaValue::string(vec![b'x'; V14_FILE_LEN]);
    container.set([LuaKey::from("darkness")], huge).unwrap();
    assert_eq!(container.to_bytes().unwrap_err().kind(), ErrorKind::PayloadTooLarge);
}

#[test]
fn load_errors_carry_the_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.sav");
    fs::write(&path, b"SGB1").unwrap();

    let err = SaveContainer::load(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    assert_eq!(err.path(), Some(path.as_path()));
    assert!(err.to_string().contains("broken.sav"));

    let missing = SaveContainer::load(dir.path().join("missing.sav")).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::Io);
}

#[test]
fn layout_tiles_the_whole_file() {
    let synthetic = Synthetic::new(15, lua::darkness(1.0));
    let bytes = synthetic.file();
    let layout = describe_layout(&bytes).unwrap();
    assert_eq!(layout.file_len, V15_FILE_LEN);

    let ids: Vec<SectionId> = layout.sections.iter().map(|s| s.id).collect();
    assert_eq!(
        ids,
        [
            SectionId::Signature,
            SectionId::Header,
            SectionId::LuaKeys,
            SectionId::MapNames,
            SectionId::LuaState,
            SectionId::Padding,
        ]
    );
    let state = layout.section(SectionId::LuaState).unwrap();
    assert_eq!(state.range.end, synthetic.content().len());
    assert_eq!(state.range.len(), 4 + lua::darkness(1.0).len());

    let v16 = describe_layout(&Synthetic::new(16, lua::darkness(1.0)).file()).unwrap();
    assert!(v16.section(SectionId::Padding).is_none());
}
