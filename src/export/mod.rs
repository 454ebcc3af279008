pub mod dsv;
