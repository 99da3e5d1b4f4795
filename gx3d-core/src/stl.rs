/// STL file parser for binary and ASCII formats
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::{all_consuming, opt},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u32},
    sequence::{preceded, terminated, tuple},
    IResult,
};

use crate::geometry::{Mesh, Triangle, Vertex};

const BINARY_HEADER_LEN: usize = 80;
const BINARY_FACET_LEN: usize = 50;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, String> {
    if data.len() < BINARY_HEADER_LEN + 4 {
        return Err("File too small to be a valid STL".to_string());
    }

    let (body, triangle_count) = preceded(take(BINARY_HEADER_LEN), le_u32)(data)
        .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| "Invalid STL header".to_string())?;
    let triangle_count = triangle_count as usize;

    if body.len() < triangle_count * BINARY_FACET_LEN {
        return Err(format!(
            "Unexpected end of file: header declares {} triangles, found room for {}",
            triangle_count,
            body.len() / BINARY_FACET_LEN
        ));
    }

    let (_, triangles) = count(binary_facet, triangle_count)(body)
        .map_err(|_| "Unexpected end of file".to_string())?;

    let mut mesh = Mesh::with_capacity(triangle_count);
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }
    Ok(mesh)
}

fn binary_vector3(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    tuple((le_f32, le_f32, le_f32))(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, (nx, ny, nz)) = binary_vector3(input)?;
    let (input, corners) = count(binary_vector3, 3)(input)?;
    // Attribute byte count
    let (input, _) = take(2usize)(input)?;

    let vertex = |(x, y, z): (f32, f32, f32)| Vertex::new(x, y, z, nx, ny, nz);
    Ok((
        input,
        Triangle::new(vertex(corners[0]), vertex(corners[1]), vertex(corners[2])),
    ))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, String> {
    match all_consuming(parse_ascii_stl_impl)(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(format!("Failed to parse ASCII STL: {:?}", e)),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?; // Optional name
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = terminated(opt(not_line_ending), multispace0)(input)?;

    let mut mesh = Mesh::with_capacity(triangles.len());
    for triangle in triangles {
        mesh.add_triangle(triangle);
    }

    Ok((input, mesh))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input, normal)?;
    let (input, v2) = parse_vertex(input, normal)?;
    let (input, v3) = parse_vertex(input, normal)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, Triangle::new(v1, v2, v3)))
}

fn parse_vertex(input: &str, normal: (f32, f32, f32)) -> IResult<&str, Vertex> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, (x, y, z)) = parse_vector3(input)?;
    Ok((input, Vertex::new(x, y, z, normal.0, normal.1, normal.2)))
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, String> {
    // Binary files may also start with "solid", so fall back on failure
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_TRIANGLE: &str = "solid part
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid part
";

    fn binary_with(triangles: &[[f32; 12]]) -> Vec<u8> {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for facet in triangles {
            for value in facet {
                data.extend_from_slice(&value.to_le_bytes());
            }
            data.extend_from_slice(&[0, 0]);
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let mesh = parse_binary_stl(&binary_with(&[])).unwrap();
        assert_eq!(mesh.triangles.len(), 0);
    }

    #[test]
    fn test_parse_binary_triangle() {
        let data = binary_with(&[[0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]]);
        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        assert_eq!(mesh.triangles[0].vertices[1].position.x, 1.0);
        assert_eq!(mesh.triangles[0].vertices[2].normal.z, 1.0);
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = binary_with(&[[0.0; 12]]);
        data.truncate(100);
        assert!(parse_binary_stl(&data).is_err());
        assert!(parse_binary_stl(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_parse_ascii_with_name() {
        let mesh = parse_stl(ASCII_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        assert_eq!(mesh.triangles[0].vertices[2].position.y, 1.0);
    }
}
