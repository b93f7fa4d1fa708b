//! OpenCV-backed image decode/encode into the `(H, W, 3)` BGR arrays used by the pipeline.

use ndarray::{Array3, ArrayView3};
use opencv::{
    core::{Mat, Scalar, Vector, CV_8UC3},
    imgcodecs,
    prelude::*,
};
use std::path::Path;

use crate::error::{PostureError, Result};

fn cv_err(context: &str, e: opencv::Error) -> PostureError {
    PostureError::image(format!("{context}: {e}"))
}

/// BGR 8bit 3ch の Mat を ndarray に変換
pub fn mat_to_array(mat: &Mat) -> Result<Array3<u8>> {
    if mat.empty() {
        return Err(PostureError::image("empty image"));
    }
    if mat.typ() != CV_8UC3 {
        return Err(PostureError::image(format!(
            "expected 8-bit 3-channel image, got type {}",
            mat.typ()
        )));
    }
    let rows = mat.rows() as usize;
    let cols = mat.cols() as usize;

    let continuous;
    let source = if mat.is_continuous() {
        mat
    } else {
        continuous = mat.try_clone().map_err(|e| cv_err("failed to copy image", e))?;
        &continuous
    };
    let bytes = source
        .data_bytes()
        .map_err(|e| cv_err("failed to read image data", e))?;

    Array3::from_shape_vec((rows, cols, 3), bytes.to_vec())
        .map_err(|e| PostureError::image(format!("unexpected image layout: {e}")))
}

/// ndarray (H, W, 3) を BGR の Mat に変換
pub fn array_to_mat(image: ArrayView3<u8>) -> Result<Mat> {
    let (h, w, c) = image.dim();
    if c != 3 {
        return Err(PostureError::image(format!("expected 3 channels, got {c}")));
    }
    let mut mat = Mat::new_rows_cols_with_default(h as i32, w as i32, CV_8UC3, Scalar::all(0.0))
        .map_err(|e| cv_err("failed to allocate image", e))?;
    let data = mat
        .data_bytes_mut()
        .map_err(|e| cv_err("failed to access image data", e))?;
    for (dst, src) in data.iter_mut().zip(image.iter()) {
        *dst = *src;
    }
    Ok(mat)
}

/// 画像ファイルを BGR で読み込む
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<Array3<u8>> {
    let path = path.as_ref();
    let path_str = path
        .to_str()
        .ok_or_else(|| PostureError::image(format!("non UTF-8 path {}", path.display())))?;
    let mat = imgcodecs::imread(path_str, imgcodecs::IMREAD_COLOR)
        .map_err(|e| cv_err(&format!("failed to read {}", path.display()), e))?;
    if mat.empty() {
        return Err(PostureError::image(format!(
            "could not decode {}",
            path.display()
        )));
    }
    mat_to_array(&mat)
}

/// 画像を書き出す（形式は拡張子で決まる）
pub fn write_image<P: AsRef<Path>>(path: P, image: ArrayView3<u8>) -> Result<()> {
    let path = path.as_ref();
    let path_str = path
        .to_str()
        .ok_or_else(|| PostureError::image(format!("non UTF-8 path {}", path.display())))?;
    let mat = array_to_mat(image)?;
    let written = imgcodecs::imwrite(path_str, &mat, &Vector::new())
        .map_err(|e| cv_err(&format!("failed to write {}", path.display()), e))?;
    if !written {
        return Err(PostureError::image(format!(
            "encoder rejected {}",
            path.display()
        )));
    }
    Ok(())
}
