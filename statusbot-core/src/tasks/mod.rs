pub mod status_loop;
