pub mod netting;
