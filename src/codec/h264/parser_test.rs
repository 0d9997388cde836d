use super::*;
use bytes::Bytes;
use pretty_assertions::assert_eq;

const SPS: [u8; 8] = [0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x28];
const PPS: [u8; 6] = [0x00, 0x00, 0x00, 0x01, 0x68, 0xEE];
const IDR: [u8; 7] = [0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x21];
const NON_IDR: [u8; 6] = [0x00, 0x00, 0x01, 0x41, 0x9A, 0x02];

fn stream(parts: &[&[u8]]) -> Bytes {
    Bytes::from(parts.concat())
}

#[test]
fn test_classify_slices() {
    let info = classify_nal_unit(&[0x65, 0x00], 0).unwrap();
    assert_eq!(info.nal_type, NALUnitType::CodedSliceIDR);
    assert_eq!(info.nal_ref_idc, 3);
    assert!(info.is_slice());
    assert!(info.is_key());

    let info = classify_nal_unit(&[0x00, 0x41], 1).unwrap();
    assert_eq!(info.nal_type, NALUnitType::CodedSliceNonIDR);
    assert!(info.is_slice());
    assert!(!info.is_key());
}

#[test]
fn test_classify_ignored_units() {
    for header in [0x06u8, 0x68, 0x09, 0x0C, 0x1F] {
        let info = classify_nal_unit(&[header], 0).unwrap();
        assert!(!info.is_slice());
        assert!(!info.is_key());
        assert_eq!(info.sps, None);
    }
}

#[test]
fn test_sps_params() {
    let info = classify_nal_unit(&SPS, 4).unwrap();
    let sps = info.sps.unwrap();
    assert_eq!(
        sps,
        SpsParams {
            profile_idc: 0x64,
            constraint_flags: 0x00,
            level_idc: 0x28,
        }
    );
    assert_eq!(sps.codec_string(), "avc1.640028");

    let baseline = SpsParams {
        profile_idc: 0x42,
        constraint_flags: 0xC0,
        level_idc: 0x0A,
    };
    assert_eq!(baseline.codec_string(), "avc1.42c00a");
}

#[test]
fn test_truncated_sps() {
    let err = classify_nal_unit(&[0x67, 0x64, 0x00], 0).unwrap_err();
    assert!(matches!(err, RfbError::Parser(_)));
}

#[test]
fn test_forbidden_zero_bit() {
    let err = classify_nal_unit(&[0xE5], 0).unwrap_err();
    assert!(matches!(err, RfbError::Parser(_)));

    let mut parser = H264Parser::new(stream(&[&[0x00, 0x00, 0x01, 0x85, 0x00]]));
    assert!(matches!(parser.next_frame(), Err(RfbError::Parser(_))));
}

#[test]
fn test_missing_header_byte() {
    let mut parser = H264Parser::new(stream(&[&[0x00, 0x00, 0x00, 0x01]]));
    assert!(parser.next_frame().is_err());
}

#[test]
fn test_assembles_frames() {
    let data = stream(&[&SPS, &PPS, &IDR, &NON_IDR]);
    let mut parser = H264Parser::new(data.clone());

    let first = parser.next_frame().unwrap().unwrap();
    assert!(first.key);
    assert_eq!(&first.data[..], &data[..SPS.len() + PPS.len() + IDR.len()]);
    assert_eq!(
        parser.sps(),
        Some(SpsParams {
            profile_idc: 0x64,
            constraint_flags: 0x00,
            level_idc: 0x28,
        })
    );

    let second = parser.next_frame().unwrap().unwrap();
    assert!(!second.key);
    assert_eq!(&second.data[..], &NON_IDR[..]);
    assert_eq!(parser.sps(), None);

    assert_eq!(parser.next_frame().unwrap(), None);
    assert_eq!(parser.next_frame().unwrap(), None);
    assert!(parser.is_exhausted());
}

#[test]
fn test_frames_share_payload_buffer() {
    let data = stream(&[&IDR, &NON_IDR]);
    let mut parser = H264Parser::new(data.clone());
    let frame = parser.next_frame().unwrap().unwrap();
    assert_eq!(frame.data.as_ptr(), data.as_ptr());
}

#[test]
fn test_empty_payload() {
    let mut parser = H264Parser::new(Bytes::new());
    assert_eq!(parser.next_frame().unwrap(), None);
    assert_eq!(parser.count(), 0);
}

#[test]
fn test_missing_start_code() {
    let mut parser = H264Parser::new(stream(&[&[0x41, 0x00, 0x00, 0x01, 0x41]]));
    assert!(matches!(parser.next_frame(), Err(RfbError::Parser(_))));
}

#[test]
fn test_trailing_units_without_slice() {
    let data = stream(&[&NON_IDR, &SPS, &PPS]);
    let mut parser = H264Parser::new(data);

    let first = parser.next_frame().unwrap().unwrap();
    assert_eq!(&first.data[..], &NON_IDR[..]);
    assert!(first.picture);

    let tail = parser.next_frame().unwrap().unwrap();
    assert!(!tail.key);
    assert!(!tail.picture);
    assert_eq!(tail.data.len(), SPS.len() + PPS.len());
    assert!(parser.sps().is_some());
    assert_eq!(parser.next_frame().unwrap(), None);
}

#[test]
fn test_iterator_stops_after_error() {
    let data = stream(&[&IDR, &[0x00, 0x00, 0x01, 0xC1, 0x00], &NON_IDR]);
    let mut parser = H264Parser::new(data);

    assert!(parser.next().unwrap().unwrap().key);
    assert!(parser.next().unwrap().is_err());
    assert!(parser.next().is_none());
}

#[test]
fn test_iterator_collects_all_frames() {
    let data = stream(&[&SPS, &PPS, &IDR, &NON_IDR, &NON_IDR, &NON_IDR]);
    let frames: Vec<EncodedFrame> = H264Parser::new(data).collect::<Result<_>>().unwrap();
    let keys: Vec<bool> = frames.iter().map(|f| f.key).collect();
    assert_eq!(keys, vec![true, false, false, false]);
}
