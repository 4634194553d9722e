//! Thin helpers over the native netcdf library.

use std::sync::Once;

use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints diagnostics even when the Rust side handles the
/// error, e.g. when probing for an optional attribute. Call this early in
/// `main()`, before any NetCDF file is opened. Safe to call repeatedly.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 with null handlers is a documented way to
        // disable automatic error printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
pub(crate) fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Numeric attribute as f64.
pub(crate) fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

/// Text attribute.
pub(crate) fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(s) => Some(s),
        AttributeValue::Strs(mut v) if !v.is_empty() => Some(v.swap_remove(0)),
        _ => None,
    }
}

/// Read a whole variable as f32, whatever its stored numeric type.
pub(crate) fn read_f32(var: &netcdf::Variable) -> netcdf::Result<Vec<f32>> {
    match var.vartype() {
        NcVariableType::Int(IntType::I16) => {
            let raw: Vec<i16> = var.get_values(..)?;
            Ok(raw.into_iter().map(f32::from).collect())
        }
        NcVariableType::Float(FloatType::F64) => {
            let raw: Vec<f64> = var.get_values(..)?;
            Ok(raw.into_iter().map(|v| v as f32).collect())
        }
        _ => var.get_values(..),
    }
}

/// Read a whole coordinate variable as f64.
pub(crate) fn read_f64(var: &netcdf::Variable) -> netcdf::Result<Vec<f64>> {
    match var.vartype() {
        NcVariableType::Int(IntType::I32) => {
            let raw: Vec<i32> = var.get_values(..)?;
            Ok(raw.into_iter().map(f64::from).collect())
        }
        NcVariableType::Int(IntType::I64) => {
            let raw: Vec<i64> = var.get_values(..)?;
            Ok(raw.into_iter().map(|v| v as f64).collect())
        }
        NcVariableType::Float(FloatType::F32) => {
            let raw: Vec<f32> = var.get_values(..)?;
            Ok(raw.into_iter().map(f64::from).collect())
        }
        _ => var.get_values(..),
    }
}

/// CF packing and missing-value attributes of a data variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
    pub fill_value: Option<f64>,
    pub missing_value: Option<f64>,
}

impl Packing {
    pub fn from_variable(var: &netcdf::Variable) -> Self {
        Self {
            scale_factor: get_f64_attr(var, "scale_factor").unwrap_or(1.0),
            add_offset: get_f64_attr(var, "add_offset").unwrap_or(0.0),
            fill_value: get_f64_attr(var, "_FillValue"),
            missing_value: get_f64_attr(var, "missing_value"),
        }
    }

    fn is_missing(&self, raw: f32) -> bool {
        if raw.is_nan() {
            return true;
        }
        let raw = raw as f64;
        self.fill_value.map_or(false, |f| raw == f as f32 as f64)
            || self.missing_value.map_or(false, |m| raw == m as f32 as f64)
    }

    /// Decode stored values in place; missing cells become NaN.
    pub fn unpack(&self, values: &mut [f32]) {
        let identity = self.scale_factor == 1.0 && self.add_offset == 0.0;
        for v in values.iter_mut() {
            if self.is_missing(*v) {
                *v = f32::NAN;
            } else if !identity {
                *v = (*v as f64 * self.scale_factor + self.add_offset) as f32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_applies_scale_and_fill() {
        let packing = Packing {
            scale_factor: 0.5,
            add_offset: 100.0,
            fill_value: Some(-32767.0),
            missing_value: None,
        };
        let mut values = vec![0.0, 2.0, -32767.0, f32::NAN];
        packing.unpack(&mut values);
        assert_eq!(values[0], 100.0);
        assert_eq!(values[1], 101.0);
        assert!(values[2].is_nan());
        assert!(values[3].is_nan());
    }

    #[test]
    fn test_unpack_missing_value_without_scaling() {
        let packing = Packing {
            scale_factor: 1.0,
            add_offset: 0.0,
            fill_value: None,
            missing_value: Some(9.96921e36),
        };
        let mut values = vec![1.5, 9.96921e36];
        packing.unpack(&mut values);
        assert_eq!(values[0], 1.5);
        assert!(values[1].is_nan());
    }
}
