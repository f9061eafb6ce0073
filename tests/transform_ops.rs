//! Integration tests for flips (fliplr, flipud, flip, flip_in_place)

mod common;

use common::arange_shaped;
use tensile::dtype::DType;
use tensile::error::Error;
use tensile::ops;
use tensile::tensor::Tensor;

#[test]
fn test_fliplr_copy_leaves_original() {
    let a = arange_shaped(&[2, 3, 4], DType::F32);
    let b = a.fliplr(false).unwrap().expect("copying flip returns a tensor");

    assert_eq!(b.shape(), a.shape());
    assert_eq!(b.get(&[0, 0, 0]).unwrap(), 3.0);
    assert_eq!(b.get(&[1, 2, 3]).unwrap(), 20.0);
    assert_eq!(a.get(&[0, 0, 0]).unwrap(), 0.0);
    assert!(!b.shares_storage(&a));
}

#[test]
fn test_fliplr_in_place_returns_none() {
    let a = arange_shaped(&[2, 3, 4], DType::I64);
    assert!(a.fliplr(true).unwrap().is_none());
    assert_eq!(
        a.to_vec::<i64>()[..8].to_vec(),
        vec![3, 2, 1, 0, 7, 6, 5, 4]
    );
}

#[test]
fn test_fliplr_in_place_mutates_shared_buffer() {
    let flat = tensile::arange(6, DType::U16).unwrap();
    let grid = flat.reshape(&[3, 2]).unwrap();
    grid.fliplr(true).unwrap();
    assert_eq!(flat.to_vec::<u16>(), vec![1, 0, 3, 2, 5, 4]);
}

#[test]
fn test_fliplr_twice_is_identity() {
    let a = arange_shaped(&[3, 5], DType::F64);
    let original = a.to_vec::<f64>();

    let once = a.fliplr(false).unwrap().unwrap();
    let twice = once.fliplr(false).unwrap().unwrap();
    assert_eq!(twice.to_vec::<f64>(), original);

    a.fliplr(true).unwrap();
    assert_ne!(a.to_vec::<f64>(), original);
    a.fliplr(true).unwrap();
    assert_eq!(a.to_vec::<f64>(), original);
}

#[test]
fn test_fliplr_rank1_and_single_column() {
    let a = tensile::arange(4, DType::I8).unwrap();
    assert_eq!(a.fliplr(false).unwrap().unwrap().to_vec::<i8>(), vec![3, 2, 1, 0]);

    let col = arange_shaped(&[3, 1], DType::I8);
    col.fliplr(true).unwrap();
    assert_eq!(col.to_vec::<i8>(), vec![0, 1, 2]);
}

#[test]
fn test_fliplr_empty_tensor() {
    let a = Tensor::zeros(&[2, 0], DType::F32);
    assert!(a.fliplr(true).unwrap().is_none());
    assert_eq!(a.fliplr(false).unwrap().unwrap().shape(), &[2, 0]);
}

#[test]
fn test_fliplr_rank0_fails() {
    let s = tensile::tensor(&[], DType::F64).unwrap();
    assert_eq!(
        s.fliplr(false).unwrap_err(),
        Error::RankError { op: "fliplr", min_rank: 1, ndim: 0 }
    );
    assert!(matches!(s.fliplr(true), Err(Error::RankError { .. })));
}

#[test]
fn test_flipud_in_place() {
    let a = arange_shaped(&[3, 2], DType::F32);
    assert!(ops::flipud(&a, true).unwrap().is_none());
    assert_eq!(a.to_vec::<f32>(), vec![4.0, 5.0, 2.0, 3.0, 0.0, 1.0]);
}

#[test]
fn test_flip_middle_axis() {
    let a = arange_shaped(&[2, 3, 2], DType::I32);
    let b = ops::flip(&a, 1).unwrap();
    assert_eq!(b.to_vec::<i32>(), vec![4, 5, 2, 3, 0, 1, 10, 11, 8, 9, 6, 7]);

    ops::flip_in_place(&a, 1).unwrap();
    assert_eq!(a.to_vec::<i32>(), b.to_vec::<i32>());
}

#[test]
fn test_flip_of_flipped_copy_restores_order() {
    let a = arange_shaped(&[4, 3], DType::BF16);
    let b = ops::flip(&ops::flip(&a, 0).unwrap(), 0).unwrap();
    assert_eq!(b.to_f64_vec(), a.to_f64_vec());
}

#[test]
fn test_in_place_flip_then_reduce() {
    let a = arange_shaped(&[2, 3, 4], DType::F64);
    a.fliplr(true).unwrap();
    let m = a.minimum(0, false).unwrap();
    assert_eq!(m.shape(), &[3, 4]);
    assert_eq!(
        m.to_vec::<f64>(),
        vec![3.0, 2.0, 1.0, 0.0, 7.0, 6.0, 5.0, 4.0, 11.0, 10.0, 9.0, 8.0]
    );
}
