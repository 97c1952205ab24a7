use ldu_mesh::data::read_cache::{f64_to_hilo, hilo_to_f64};
use ldu_mesh::data::{ChannelKind, DeviceBuffer, ReadCache};
use ldu_mesh::mesh_error::MeshError;
use serial_test::serial;

fn live() -> usize {
    ReadCache::<f64>::live_handles()
}

#[test]
#[serial]
fn f64_fetch_is_bit_exact() {
    let nan_payload = f64::from_bits(0x7ff8_0000_dead_beef);
    let values = [
        0.0,
        -0.0,
        1e300,
        -123.456,
        f64::MIN_POSITIVE / 4.0, // subnormal
        f64::INFINITY,
        f64::NEG_INFINITY,
        nan_payload,
        std::f64::consts::PI,
    ];
    let buf = DeviceBuffer::from_host(&values).unwrap();
    let cache = ReadCache::bind(&buf);
    assert_eq!(cache.format().words, 2);
    assert_eq!(cache.format().kind, ChannelKind::Signed);
    for (i, v) in values.iter().enumerate() {
        assert_eq!(cache.fetch(i).to_bits(), v.to_bits(), "index {i}");
    }
    cache.destroy();
}

#[test]
#[serial]
fn halves_compose_back_to_the_value() {
    for v in [0.0f64, -0.0, 1e300, -7.5] {
        let (hi, lo) = f64_to_hilo(v);
        assert_eq!(hilo_to_f64(hi, lo).to_bits(), v.to_bits());
    }
    assert_eq!(f64_to_hilo(-0.0), (0x8000_0000, 0));
}

#[test]
#[serial]
fn single_word_types_fetch_natively() {
    let f = DeviceBuffer::from_host(&[1.5f32, -0.0, f32::MAX]).unwrap();
    let cf = ReadCache::bind(&f);
    assert_eq!(cf.format().kind, ChannelKind::Float);
    assert_eq!(cf.fetch(1).to_bits(), (-0.0f32).to_bits());
    assert_eq!(cf.fetch(2), f32::MAX);

    let l = DeviceBuffer::from_host(&[i32::MIN, -1, 0, i32::MAX]).unwrap();
    let cl = ReadCache::bind(&l);
    assert_eq!(cl.format().kind, ChannelKind::Signed);
    assert_eq!((0..4).map(|i| cl.fetch(i)).collect::<Vec<_>>(), vec![i32::MIN, -1, 0, i32::MAX]);
}

#[test]
#[serial]
fn region_binding_offsets_indices() {
    let buf = DeviceBuffer::from_host(&[10.0, 11.0, 12.0, 13.0]).unwrap();
    let cache = ReadCache::bind_region(&buf, 1, 2).unwrap();
    assert_eq!(cache.count(), 2);
    assert_eq!(cache.fetch(0), 11.0);
    assert_eq!(cache.fetch(1), 12.0);

    assert_eq!(
        ReadCache::bind_region(&buf, 3, 2).unwrap_err(),
        MeshError::CacheRegionOutOfRange { offset: 3, count: 2, len: 4 }
    );
}

#[test]
#[serial]
fn handles_are_released_on_destroy_and_drop() {
    let before = live();
    let buf = DeviceBuffer::from_host(&[1.0, 2.0]).unwrap();
    let a = ReadCache::bind(&buf);
    let b = ReadCache::bind(&buf);
    assert_ne!(a.handle(), b.handle());
    assert_eq!(live(), before + 2);
    a.destroy();
    assert_eq!(live(), before + 1);
    drop(b);
    assert_eq!(live(), before);
}

#[test]
#[serial]
fn rebind_replaces_the_handle() {
    let before = live();
    let x = DeviceBuffer::from_host(&[1.0, 2.0, 3.0]).unwrap();
    let y = DeviceBuffer::from_host(&[9.0]).unwrap();
    let mut cache = ReadCache::bind(&x);
    let first = cache.handle();
    cache.rebind(&y);
    assert_ne!(cache.handle(), first);
    assert_eq!(cache.count(), 1);
    assert_eq!(cache.fetch(0), 9.0);
    assert_eq!(live(), before + 1);

    // a failed region rebind keeps the current binding
    assert!(cache.rebind_region(&x, 2, 5).is_err());
    assert_eq!(cache.fetch(0), 9.0);
    cache.rebind_region(&x, 1, 2).unwrap();
    assert_eq!(cache.fetch(1), 3.0);
    cache.destroy();
    assert_eq!(live(), before);
}
