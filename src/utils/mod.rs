mod read_ext;

pub use self::read_ext::ReadSeek;
pub(crate) use self::read_ext::ReadExt;
