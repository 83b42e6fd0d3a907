pub mod service_ca;
