pub(crate) use pipe::Pipe;

mod https;
mod pipe;
