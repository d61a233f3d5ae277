pub mod geodesy;
