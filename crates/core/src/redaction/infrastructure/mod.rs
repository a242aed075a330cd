pub mod opaque_box_redactor;
