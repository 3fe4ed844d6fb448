//! Single-slot "latest depth" register shared between the sensor feed and
//! the depth-hold loop.

use tokio::sync::watch;

/// Creates a connected writer/reader pair holding `initial` until the first update
pub fn depth_register(initial: f64) -> (DepthWriter, DepthReader) {
    let (sender, receiver) = watch::channel(clamp_depth(initial));
    (DepthWriter { sender }, DepthReader { receiver })
}

fn clamp_depth(depth: f64) -> f64 {
    if depth < 0.0 {
        0.0
    } else {
        depth
    }
}

/// Producer side, owned by the sensor feed
#[derive(Debug)]
pub struct DepthWriter {
    sender: watch::Sender<f64>,
}

impl DepthWriter {
    /// Replaces the stored depth. Negative readings are stored as 0.
    pub fn publish(&self, depth: f64) -> f64 {
        let depth = clamp_depth(depth);
        self.sender.send_replace(depth);
        depth
    }

    pub fn subscribe(&self) -> DepthReader {
        DepthReader {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Consumer side, read once per depth-hold tick
#[derive(Clone, Debug)]
pub struct DepthReader {
    receiver: watch::Receiver<f64>,
}

impl DepthReader {
    /// Most recently published depth; never blocks
    pub fn latest(&self) -> f64 {
        *self.receiver.borrow()
    }
}
