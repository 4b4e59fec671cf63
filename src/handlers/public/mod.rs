// handlers/public/mod.rs - Public site handlers
//
// Security Level: generic Basic credentials (required)
// Route Prefix: /contact
// Middleware: basic → decrypt → encrypt-response

pub mod contact;

pub use contact::create_appointment;
