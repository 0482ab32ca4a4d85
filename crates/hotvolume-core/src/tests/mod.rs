mod audio;
mod volume;
