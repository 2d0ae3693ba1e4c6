pub mod configuration;
pub mod controller;
pub mod counting;
pub mod data_capture;
pub mod detection;
pub mod error_handling;
pub mod network;
pub mod reporting;
pub mod session_management;
