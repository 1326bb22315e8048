pub mod remote_addr;
