pub mod exemption;
