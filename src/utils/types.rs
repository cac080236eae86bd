// Type aliases for data values.
pub type Vertex3 = [f64; 3];
/// A triangle of the output, as indices into the input point list.
pub type IndexedTri = [usize; 3];

// Type aliases for data indices.
pub type VertexIdx = usize;

// Type aliases for data structure indices.
// This is to know, when a function accepts or returns a usize, what it is for.
pub type TriIteratorIdx = usize;
pub type SuperVertexIdx = usize;
