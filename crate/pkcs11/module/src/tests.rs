//! Tests of the C entry points against the process wide registry.

use std::{ptr, sync::Once};

use pkcs11_sys::{
    CK_MECHANISM_INFO, CK_MECHANISM_TYPE, CK_SLOT_ID, CK_ULONG, CKM_AES_KEY_GEN,
    CKR_ARGUMENTS_BAD, CKR_BUFFER_TOO_SMALL, CKR_MECHANISM_INVALID, CKR_OK, CKR_SLOT_ID_INVALID,
};
use serial_test::serial;

use crate::{
    C_GetMechanismInfo, C_GetMechanismList, MError, MResult,
    config::ModuleConfig,
    core::slot::SlotId,
    initialize, initialize_from_env,
    registry::MechanismRegistry,
    traits::{MechanismProvider, provider, register_provider},
};

const SLOT_ID: CK_SLOT_ID = 1;
// (CK_ULONG)-10
const INVALID: CK_ULONG = CK_ULONG::MAX - 9;

static SETUP: Once = Once::new();

fn setup() {
    SETUP.call_once(|| {
        cosmian_logger::log_init(Some("cosmian_pkcs11_mechanisms=trace"));
        let config = ModuleConfig {
            log_home: Some(std::env::temp_dir().join("cosmian-pkcs11-mechanisms-tests")),
            ..ModuleConfig::default()
        };
        initialize(&config).expect("failed initializing the module");
    });
}

fn mechanism_count() -> CK_ULONG {
    let mut count: CK_ULONG = 0;
    let rv = unsafe { C_GetMechanismList(SLOT_ID, ptr::null_mut(), &mut count) };
    assert_eq!(rv, CKR_OK);
    count
}

#[test]
#[serial]
fn test_get_mechanism_list_good() {
    setup();
    let mut mechs: [CK_MECHANISM_TYPE; 256] = [0; 256];

    // the count on entry is ignored when no list is given
    let mut mech_cnt: CK_ULONG = 0xdead;
    let rv = unsafe { C_GetMechanismList(SLOT_ID, ptr::null_mut(), &mut mech_cnt) };
    assert_eq!(rv, CKR_OK);
    assert!((1..=mechs.len() as CK_ULONG).contains(&mech_cnt));
    let expected = mech_cnt;

    let rv = unsafe { C_GetMechanismList(SLOT_ID, mechs.as_mut_ptr(), &mut mech_cnt) };
    assert_eq!(rv, CKR_OK);
    assert_eq!(mech_cnt, expected);
    assert!(mechs[..mech_cnt as usize].contains(&CKM_AES_KEY_GEN));

    // the full buffer capacity is accepted and the count is rewritten
    let mut again: [CK_MECHANISM_TYPE; 256] = [0; 256];
    let mut capacity = again.len() as CK_ULONG;
    let rv = unsafe { C_GetMechanismList(SLOT_ID, again.as_mut_ptr(), &mut capacity) };
    assert_eq!(rv, CKR_OK);
    assert_eq!(capacity, expected);
    assert_eq!(mechs, again);
}

#[test]
#[serial]
fn test_get_mechanism_list_bad() {
    setup();
    let mut mech_cnt: CK_ULONG = 0;

    // Invalid slot
    let rv = unsafe { C_GetMechanismList(INVALID, ptr::null_mut(), &mut mech_cnt) };
    assert_eq!(rv, CKR_SLOT_ID_INVALID);

    // no list and no count: there is nothing to validate
    let rv = unsafe { C_GetMechanismList(SLOT_ID, ptr::null_mut(), ptr::null_mut()) };
    assert_eq!(rv, CKR_OK);

    let mut mechs: [CK_MECHANISM_TYPE; 1] = [0x4242];
    let rv = unsafe { C_GetMechanismList(SLOT_ID, mechs.as_mut_ptr(), ptr::null_mut()) };
    assert_eq!(rv, CKR_ARGUMENTS_BAD);

    let required = mechanism_count();
    assert_ne!(required, mechs.len() as CK_ULONG);

    let mut value: CK_ULONG = 0;
    let rv = unsafe { C_GetMechanismList(SLOT_ID, mechs.as_mut_ptr(), &mut value) };
    assert_eq!(rv, CKR_BUFFER_TOO_SMALL);
    assert_eq!(value, required);

    // Low count but buffer present
    let mut value = mechs.len() as CK_ULONG;
    let rv = unsafe { C_GetMechanismList(SLOT_ID, mechs.as_mut_ptr(), &mut value) };
    assert_eq!(rv, CKR_BUFFER_TOO_SMALL);
    assert_eq!(value, required);
    assert_eq!(mechs, [0x4242]);

    // an invalid slot wins over a malformed call
    let rv = unsafe { C_GetMechanismList(INVALID, mechs.as_mut_ptr(), ptr::null_mut()) };
    assert_eq!(rv, CKR_SLOT_ID_INVALID);
}

#[test]
#[serial]
fn test_get_mechanism_list_huge_capacity() {
    setup();
    let expected = mechanism_count();
    let mut mechs: [CK_MECHANISM_TYPE; 256] = [0x4242; 256];

    // only the written mechanisms are addressed, whatever the declared capacity
    let mut mech_cnt = CK_ULONG::MAX;
    let rv = unsafe { C_GetMechanismList(SLOT_ID, mechs.as_mut_ptr(), &mut mech_cnt) };
    assert_eq!(rv, CKR_OK);
    assert_eq!(mech_cnt, expected);
    assert!(mechs[..expected as usize].contains(&CKM_AES_KEY_GEN));
    assert!(mechs[expected as usize..].iter().all(|m| *m == 0x4242));

    let mut mech_cnt = CK_ULONG::MAX;
    let rv = unsafe { C_GetMechanismList(INVALID, mechs.as_mut_ptr(), &mut mech_cnt) };
    assert_eq!(rv, CKR_SLOT_ID_INVALID);
    assert_eq!(mech_cnt, CK_ULONG::MAX);
}

#[test]
#[serial]
fn test_get_mechanism_info_good() {
    setup();
    let mut mech_info = CK_MECHANISM_INFO {
        ulMinKeySize: 0,
        ulMaxKeySize: 0,
        flags: 0xff,
    };
    let rv = unsafe { C_GetMechanismInfo(SLOT_ID, CKM_AES_KEY_GEN, &mut mech_info) };
    assert_eq!(rv, CKR_OK);

    let (min, max, flags) = (
        mech_info.ulMinKeySize,
        mech_info.ulMaxKeySize,
        mech_info.flags,
    );
    assert_eq!(max, 512);
    assert_eq!(min, 128);
    assert_eq!(flags, 0);
}

#[test]
#[serial]
fn test_get_mechanism_info_bad() {
    setup();
    let mut mech_info = CK_MECHANISM_INFO {
        ulMinKeySize: 0,
        ulMaxKeySize: 0,
        flags: 0,
    };

    // Invalid mechanism
    let rv = unsafe { C_GetMechanismInfo(SLOT_ID, INVALID, &mut mech_info) };
    assert_eq!(rv, CKR_MECHANISM_INVALID);

    // NULL arguments
    let rv = unsafe { C_GetMechanismInfo(SLOT_ID, CKM_AES_KEY_GEN, ptr::null_mut()) };
    assert_eq!(rv, CKR_ARGUMENTS_BAD);
    let rv = unsafe { C_GetMechanismInfo(INVALID, INVALID, ptr::null_mut()) };
    assert_eq!(rv, CKR_ARGUMENTS_BAD);

    // Invalid slot ID
    let rv = unsafe { C_GetMechanismInfo(INVALID, CKM_AES_KEY_GEN, &mut mech_info) };
    assert_eq!(rv, CKR_SLOT_ID_INVALID);
}

#[test]
#[serial]
fn test_every_listed_mechanism_has_info() {
    setup();
    let mut count = mechanism_count();
    let mut mechs: Vec<CK_MECHANISM_TYPE> = vec![0; count as usize];
    let rv = unsafe { C_GetMechanismList(SLOT_ID, mechs.as_mut_ptr(), &mut count) };
    assert_eq!(rv, CKR_OK);
    for mechanism in mechs {
        let mut mech_info = CK_MECHANISM_INFO {
            ulMinKeySize: 0,
            ulMaxKeySize: 0,
            flags: 0,
        };
        let rv = unsafe { C_GetMechanismInfo(SLOT_ID, mechanism, &mut mech_info) };
        assert_eq!(rv, CKR_OK);
        let (min, max) = (mech_info.ulMinKeySize, mech_info.ulMaxKeySize);
        assert!(min <= max, "mechanism {mechanism:#x}: {min} > {max}");
    }
}

#[test]
#[serial]
fn test_provider_is_registered_once() -> MResult<()> {
    setup();
    assert!(provider()?.is_valid_slot(SlotId::new(SLOT_ID)));
    let second = MechanismRegistry::with_default_table([SlotId::new(2)])?;
    assert_eq!(
        register_provider(Box::new(second)),
        Err(MError::CryptokiAlreadyInitialized)
    );
    // the first registration is kept
    assert!(!provider()?.is_valid_slot(SlotId::new(2)));
    if ModuleConfig::from_env().is_ok() {
        assert_eq!(initialize_from_env(), Err(MError::CryptokiAlreadyInitialized));
    }
    Ok(())
}
