mod dispatcher;
mod sink;

pub use {
    dispatcher::{AUTO_SEND_PERIOD, Dispatcher, describe_response},
    sink::{COLOR_PATH, ColorSink, HttpColorSink, SinkResponse},
};
