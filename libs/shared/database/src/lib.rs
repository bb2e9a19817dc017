pub mod identity;
pub mod supabase;

pub use identity::{InMemoryIdentityDirectory, SupabaseIdentityResolver};
pub use supabase::SupabaseClient;
