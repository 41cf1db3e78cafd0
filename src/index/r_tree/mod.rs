mod nodes;

pub use nodes::RTree;

const NODE_WIDTH: usize = 32;
const MIN_FILL: usize = 8;
