pub mod tri_data_structure;
pub mod tri_iterator;
