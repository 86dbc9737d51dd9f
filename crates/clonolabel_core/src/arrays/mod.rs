pub mod array;
pub mod batch;
pub mod datatype;
pub mod field;
pub mod key;
pub mod scalar;
