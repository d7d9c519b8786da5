mod athletes;
mod sequence;
mod support;
